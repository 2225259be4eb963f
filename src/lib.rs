//! Orchestration for a lightning wallet client: invoice generation and chain sync tracking on
//! top of a node client, a field-observable store and a handful of UI side-effect sinks.

pub mod config;
pub mod node;
pub mod poll;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflows;

#[cfg(test)]
mod testing;
