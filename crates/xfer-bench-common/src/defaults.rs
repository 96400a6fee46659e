//! Default configuration values shared across the suite
//!
//! These constants keep the CLI, the coordinator and the tests in
//! agreement about defaults.

/// Default per-slot timeout in seconds (2 hours). 0 disables the timeout.
pub const DEFAULT_SLOT_TIMEOUT: u64 = 7200;

/// Default raw results table produced by the collector export
pub const DEFAULT_RAW_TABLE: &str = "results.csv";

/// Default normalized output table
pub const DEFAULT_CLEAN_TABLE: &str = "results_clean.csv";

/// Header carrying the pre-shared collector API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Delimiter of the raw and normalized result tables
pub const TABLE_DELIMITER: char = ';';

/// Canonical zero-value timestamp marking a field that was never set
pub const SENTINEL_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

/// Datetime format of the result tables
pub const TABLE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Rerun schedule recovered from the experiment design: single-client
/// configurations are repeated often, parallel configurations less so.
pub fn default_reruns(parallel_clients: u32) -> u32 {
    match parallel_clients {
        1 => 25,
        _ => 3,
    }
}
