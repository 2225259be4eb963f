//! Progress estimation for chain synchronization.
//!
//! This module provides the `SyncProgressEstimator`, which turns the node's best header
//! timestamp into a rough fraction of chain time caught up. The first timestamp seen is kept as
//! the anchor for the lifetime of the estimator; every estimate measures how far headers have
//! moved from the anchor relative to how far the wall clock is from it.
//!
//! The estimate is a heuristic. Headers jumping backwards, or an anchor recorded after the node
//! was already most of the way through, can push the raw value outside [0, 1]; the value handed
//! to the store is clamped.

use std::sync::OnceLock;
use tracing::{debug, info};

/// Stand-in for a zero wall clock distance from the anchor.
pub const PROGRESS_EPSILON: f64 = 0.001;

/// Raw progress estimate, unclamped.
///
/// `progress so far / total progress`, where progress so far is the header distance from the
/// anchor (zero while no header timestamp is known) and total progress is the wall clock
/// distance from the anchor, or [`PROGRESS_EPSILON`] when that is zero.
pub fn estimate_progress(anchor: i64, best_header_timestamp: i64, now: i64) -> f64 {
    let progress_so_far = if best_header_timestamp > 0 {
        best_header_timestamp.saturating_sub(anchor) as f64
    } else {
        0.0
    };
    let elapsed = now.saturating_sub(anchor);
    let total_progress = if elapsed == 0 {
        PROGRESS_EPSILON
    } else {
        elapsed as f64
    };
    progress_so_far / total_progress
}

/// Clamp a raw estimate into [0, 1]; anything non-finite becomes 0.
pub fn clamp_progress(raw: f64) -> f64 {
    if !raw.is_finite() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// An estimate in both raw and clamped form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncEstimate {
    pub raw: f64,
    pub percent: f64,
}

/// Keeps the sync anchor and produces progress estimates against it.
#[derive(Debug, Default)]
pub struct SyncProgressEstimator {
    /// Header timestamp of the first successful status fetch
    anchor: OnceLock<i64>,
}

impl SyncProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor on `best_header_timestamp` (0 when absent) unless already anchored, and return
    /// the anchor in effect.
    pub fn anchor(&self, best_header_timestamp: Option<i64>) -> i64 {
        *self.anchor.get_or_init(|| {
            let anchor = best_header_timestamp.unwrap_or(0);
            info!("Anchoring sync progress at header timestamp {}", anchor);
            anchor
        })
    }

    /// The anchor, if one has been recorded.
    pub fn anchor_timestamp(&self) -> Option<i64> {
        self.anchor.get().copied()
    }

    /// Estimate progress for the given header timestamp at wall clock time `now`.
    ///
    /// Anchors first if this is the first estimate.
    pub fn estimate(&self, best_header_timestamp: Option<i64>, now: i64) -> SyncEstimate {
        let anchor = self.anchor(best_header_timestamp);
        let raw = estimate_progress(anchor, best_header_timestamp.unwrap_or(0), now);
        let percent = clamp_progress(raw);
        if raw != percent {
            debug!("Clamped sync progress estimate {} to {}", raw, percent);
        }
        SyncEstimate { raw, percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfway_between_anchor_and_now() {
        assert_eq!(estimate_progress(1000, 1500, 2000), 0.5);
    }

    #[test]
    fn unknown_header_means_no_progress() {
        assert_eq!(estimate_progress(1000, 0, 2000), 0.0);
    }

    #[test]
    fn zero_elapsed_uses_epsilon_and_stays_finite() {
        let raw = estimate_progress(1000, 1500, 1000);
        assert!(raw.is_finite());
        assert_eq!(raw, 500.0 / PROGRESS_EPSILON);
        assert_eq!(clamp_progress(raw), 1.0);
    }

    #[test]
    fn backwards_headers_go_negative_raw_and_clamp_to_zero() {
        let raw = estimate_progress(1000, 900, 2000);
        assert!(raw < 0.0);
        assert_eq!(clamp_progress(raw), 0.0);
        assert_eq!(clamp_progress(f64::NAN), 0.0);
        assert_eq!(clamp_progress(f64::INFINITY), 0.0);
    }

    #[test]
    fn anchor_is_set_once() {
        let estimator = SyncProgressEstimator::new();
        assert_eq!(estimator.anchor_timestamp(), None);

        assert_eq!(estimator.anchor(Some(1000)), 1000);
        assert_eq!(estimator.anchor(Some(5000)), 1000);
        assert_eq!(estimator.anchor_timestamp(), Some(1000));
    }

    #[test]
    fn missing_header_anchors_at_zero() {
        let estimator = SyncProgressEstimator::new();
        assert_eq!(estimator.anchor(None), 0);
        assert_eq!(estimator.anchor(Some(1000)), 0);
    }

    #[test]
    fn estimate_uses_the_first_anchor() {
        let estimator = SyncProgressEstimator::new();
        estimator.anchor(Some(1000));

        let estimate = estimator.estimate(Some(1500), 2000);
        assert_eq!(estimate, SyncEstimate { raw: 0.5, percent: 0.5 });
    }
}
