//! AWS-oriented adapters and handlers for relaying Data Exchange revision
//! exports.
//!
//! This crate owns runtime integration details (Lambda handler, provider
//! adapters, configuration, and logging) and re-exports the domain crate as
//! a single `runtime` module boundary.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;

pub use adx_export_core as runtime;
