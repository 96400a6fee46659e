//! xfer-bench-suite - Run orchestration and result normalization
//!
//! This crate provides the `xfer-bench` binary: it coordinates parallel
//! external test-client runs against a remote metrics collector, and it
//! repairs the collector's raw CSV export into an analysis-ready table.

pub mod clean;
pub mod collector;
pub mod config;
pub mod coordinator;
pub mod launcher;
