//! Node daemon integration
//!
//! This module provides the client contract and types for executing commands against the
//! wallet's node daemon. The workflows only depend on the [`NodeClient`] trait; the REST
//! implementation is what the binary wires in.

/// Client trait and REST implementation
mod client;
/// Request, response and error types for node commands
mod types;

pub use client::{NodeClient, RestNodeClient};
pub use types::*;
