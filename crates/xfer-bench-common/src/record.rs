//! The raw/cleaned row of the metrics table
//!
//! A [`ResultRecord`] is parsed from one row of the collector export,
//! mutated in place by the repair pipeline, then serialized once to the
//! normalized table. Derived metrics are pure functions of the stored
//! fields and are recomputed at write time, never parsed back in.
//!
//! `protocol`, `environment` and `time_slot` stay plain strings here:
//! the normalizer passes unknown protocols through untouched, so the
//! record must be able to carry them.

use chrono::{DateTime, Utc};

use crate::defaults::{SENTINEL_TIMESTAMP, TABLE_DATETIME_FORMAT};

/// One row of the result table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub id: i64,
    pub protocol: String,
    pub environment: String,
    pub time_slot: String,
    /// Wall-clock begin/end of the whole test, reported by the collector
    pub test_begin: DateTime<Utc>,
    pub test_end: DateTime<Utc>,
    pub client_id: i64,
    pub parallel_clients: i64,
    /// Transfer window in unix seconds (WebRTC reports milliseconds upstream)
    pub transfer_start: i64,
    pub transfer_end: i64,
    pub bytes_payload: i64,
    pub cpu_client_before: f64,
    pub cpu_client_after: f64,
    pub cpu_client_while: f64,
    pub cpu_server_before: f64,
    pub cpu_server_after: f64,
    pub cpu_server_while: f64,
    pub ram_client_before: i64,
    pub ram_client_after: i64,
    pub ram_client_while: i64,
    pub ram_server_before: i64,
    pub ram_server_after: i64,
    pub ram_server_while: i64,
    pub lost_packets: i64,
    pub error: String,
    /// Estimated total bytes on the wire, including protocol overhead
    pub bytes_sent_total: i64,
    /// Ran-once marker: set on write, checked on read, so re-cleaning an
    /// already-cleaned table never reapplies the repair pipeline.
    pub normalized: bool,
}

impl ResultRecord {
    /// Format a datetime the way the result tables do.
    pub fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.format(TABLE_DATETIME_FORMAT).to_string()
    }

    /// Whether a datetime is the never-set zero value.
    pub fn is_sentinel(dt: &DateTime<Utc>) -> bool {
        Self::format_datetime(dt) == SENTINEL_TIMESTAMP
    }

    /// Throughput in Mbps over the transfer window.
    ///
    /// Float division: a zero-length window yields inf (or NaN for an
    /// all-zero record). That is the upstream contract and is emitted
    /// as-is rather than guarded.
    pub fn throughput_mbps(&self) -> f64 {
        self.bytes_payload as f64 / (self.transfer_end - self.transfer_start) as f64 * 8.0
            / 1_000_000.0
    }

    /// Payload share of the estimated bytes on the wire.
    pub fn bandwidth_efficiency(&self) -> f64 {
        self.bytes_payload as f64 / self.bytes_sent_total as f64
    }

    /// Whole seconds between test begin and test end.
    pub fn connection_duration(&self) -> i64 {
        (self.test_end - self.test_begin).num_seconds()
    }

    /// Seconds between transfer start and transfer end.
    pub fn transfer_duration(&self) -> i64 {
        self.transfer_end - self.transfer_start
    }

    /// Append a repair note to the error field.
    ///
    /// An error set by an earlier stage is never overwritten, only
    /// extended with a `" / "` separator.
    pub fn append_error(&mut self, note: &str) {
        if self.error.is_empty() {
            self.error = note.to_string();
        } else {
            self.error = format!("{} / {}", self.error, note);
        }
    }

    /// Zero every numeric metric field. Used by the sentinel stage when
    /// the record carries no trustworthy measurement at all.
    pub fn zero_metrics(&mut self) {
        self.transfer_start = 0;
        self.transfer_end = 0;
        self.bytes_payload = 0;
        self.cpu_client_before = 0.0;
        self.cpu_client_after = 0.0;
        self.cpu_client_while = 0.0;
        self.cpu_server_before = 0.0;
        self.cpu_server_after = 0.0;
        self.cpu_server_while = 0.0;
        self.ram_client_before = 0;
        self.ram_client_after = 0;
        self.ram_client_while = 0;
        self.ram_server_before = 0;
        self.ram_server_after = 0;
        self.ram_server_while = 0;
        self.lost_packets = 0;
        self.bytes_sent_total = 0;
    }
}

impl Default for ResultRecord {
    fn default() -> Self {
        let zero = DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default();
        Self {
            id: 0,
            protocol: String::new(),
            environment: String::new(),
            time_slot: String::new(),
            test_begin: zero,
            test_end: zero,
            client_id: 0,
            parallel_clients: 0,
            transfer_start: 0,
            transfer_end: 0,
            bytes_payload: 0,
            cpu_client_before: 0.0,
            cpu_client_after: 0.0,
            cpu_client_while: 0.0,
            cpu_server_before: 0.0,
            cpu_server_after: 0.0,
            cpu_server_while: 0.0,
            ram_client_before: 0,
            ram_client_after: 0,
            ram_client_while: 0,
            ram_server_before: 0,
            ram_server_after: 0,
            ram_server_while: 0,
            lost_packets: 0,
            error: String::new(),
            bytes_sent_total: 0,
            normalized: false,
        }
    }
}
