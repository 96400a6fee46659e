//! Configuration types for the experiment suite

use std::path::PathBuf;

use xfer_bench_common::{Environment, Protocol, TimeSlot};

/// Remote collector endpoint and credentials
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Base URL of the collector service
    pub base_url: String,
    /// Pre-shared API key sent on every request
    pub api_key: String,
}

/// What to test: the experiment matrix
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Protocols to test, run one after another
    pub protocols: Vec<Protocol>,
    /// Parallel-client counts to test per protocol
    pub parallel_counts: Vec<u32>,
    /// Time slot label for this session
    pub time_slot: TimeSlot,
    /// Run clients against a local server
    pub local: bool,
    /// Batch repetitions per configuration (None = schedule default)
    pub reruns: Option<u32>,
}

/// Runtime behavior flags
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    /// Directory holding the protocol-named client directories
    pub client_root: PathBuf,
    /// Per-slot timeout in seconds, 0 disables
    pub slot_timeout: u64,
    /// Optional JSON report file
    pub output: Option<String>,
}

/// Configuration for an experiment session
///
/// Composed of focused sub-configs for organization.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub collector: CollectorConfig,
    pub experiment: ExperimentConfig,
    pub flags: RuntimeFlags,
}

/// One batch: a single (protocol, parallel-client count) invocation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub protocol: Protocol,
    pub time_slot: TimeSlot,
    pub local: bool,
    pub parallel_clients: u32,
    /// Per-slot timeout in seconds, 0 disables
    pub slot_timeout: u64,
}

impl BatchConfig {
    pub fn environment(&self) -> Environment {
        Environment::from_local_flag(self.local)
    }
}
