//! Shared revision export domain primitives.
//!
//! This crate owns event contracts, asset batching, and destination key
//! rendering. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod batching;
pub mod contract;
pub mod storage_keys;
