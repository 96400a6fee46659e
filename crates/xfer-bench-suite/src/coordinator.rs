//! Batch run coordination
//!
//! Fans out one task per client slot for a (protocol, parallel-client
//! count) configuration. Every task independently requests a run id and
//! launches the external client; a failure in one slot never aborts its
//! siblings, and the batch only reports once every slot has finished.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::collector::{CollectorClient, RunRequest};
use crate::config::BatchConfig;
use crate::launcher::ClientLauncher;
use xfer_bench_common::Protocol;

/// Outcome of one client slot
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// 1-based slot number within the batch
    pub client_slot: u32,
    /// Collector-assigned run id, if one was obtained
    pub run_id: Option<i64>,
    /// Why the slot failed, if it did
    pub error: Option<String>,
}

impl RunOutcome {
    pub fn success(client_slot: u32, run_id: i64) -> Self {
        Self {
            client_slot,
            run_id: Some(run_id),
            error: None,
        }
    }

    pub fn failure(client_slot: u32, run_id: Option<i64>, error: impl Into<String>) -> Self {
        Self {
            client_slot,
            run_id,
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated outcomes of one batch
#[derive(Debug)]
pub struct BatchReport {
    pub protocol: Protocol,
    pub parallel_clients: u32,
    /// One outcome per slot, sorted by slot number
    pub outcomes: Vec<RunOutcome>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(RunOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RunOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Log the batch result the way the suite reports to the operator.
    pub fn log_summary(&self) {
        if self.all_succeeded() {
            info!(
                protocol = %self.protocol,
                parallel_clients = self.parallel_clients,
                "All clients finished successfully"
            );
        } else {
            for outcome in self.failures() {
                error!(
                    protocol = %self.protocol,
                    client_slot = outcome.client_slot,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Client run failed"
                );
            }
        }
    }

    /// Render a per-slot summary table.
    pub fn summary_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Slot"),
                Cell::new("Run ID"),
                Cell::new("Status"),
                Cell::new("Error"),
            ]);

        for outcome in &self.outcomes {
            let run_id = outcome
                .run_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let status = if outcome.succeeded() { "ok" } else { "failed" };
            table.add_row(vec![
                Cell::new(outcome.client_slot),
                Cell::new(run_id),
                Cell::new(status),
                Cell::new(outcome.error.as_deref().unwrap_or("")),
            ]);
        }
        table
    }

    /// JSON value for the session report file.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "protocol": self.protocol.to_string(),
            "parallel_clients": self.parallel_clients,
            "success": self.all_succeeded(),
            "outcomes": self.outcomes.iter().map(|o| {
                serde_json::json!({
                    "client_slot": o.client_slot,
                    "run_id": o.run_id,
                    "error": o.error,
                })
            }).collect::<Vec<_>>(),
        })
    }
}

/// Run one batch: spawn every slot, join them all, report.
///
/// All slots are spawned before any are awaited; the collector call and
/// the process wait block only their owning task. There is no ordering
/// between slots, the slot number only labels the request.
pub async fn run_batch(
    collector: &CollectorClient,
    launcher: &ClientLauncher,
    batch: &BatchConfig,
    cancel: &CancellationToken,
) -> BatchReport {
    let environment = batch.environment();
    info!(
        protocol = %batch.protocol,
        environment = %environment,
        time_slot = %batch.time_slot,
        parallel_clients = batch.parallel_clients,
        "Starting batch"
    );

    let mut handles = Vec::with_capacity(batch.parallel_clients as usize);
    for slot in 1..=batch.parallel_clients {
        let collector = collector.clone();
        let launcher = launcher.clone();
        let batch = batch.clone();
        let cancel = cancel.clone();
        handles.push((
            slot,
            tokio::spawn(async move { run_slot(slot, &collector, &launcher, &batch, &cancel).await }),
        ));
    }

    // Join every slot before reporting; a panicked task becomes a
    // failed outcome for its slot instead of poisoning the batch.
    let mut outcomes = Vec::with_capacity(handles.len());
    for (slot, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                RunOutcome::failure(slot, None, format!("client task panicked: {join_error}"))
            }
        };
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|o| o.client_slot);

    let report = BatchReport {
        protocol: batch.protocol,
        parallel_clients: batch.parallel_clients,
        outcomes,
    };
    report.log_summary();
    report
}

/// One slot: obtain a run id, launch the client, convert any failure
/// into an outcome local to this slot.
async fn run_slot(
    slot: u32,
    collector: &CollectorClient,
    launcher: &ClientLauncher,
    batch: &BatchConfig,
    cancel: &CancellationToken,
) -> RunOutcome {
    info!(protocol = %batch.protocol, client_slot = slot, "Running client");

    let request = RunRequest {
        protocol: batch.protocol,
        environment: batch.environment(),
        time_slot: batch.time_slot,
        client_id: slot,
        parallel_clients: batch.parallel_clients,
    };

    let run_id = match collector.get_run_id(&request).await {
        Ok(id) => id,
        Err(e) => return RunOutcome::failure(slot, None, e.to_string()),
    };

    match launcher
        .run(run_id, batch.local, batch.slot_timeout, cancel)
        .await
    {
        Ok(()) => {
            info!(
                protocol = %batch.protocol,
                client_slot = slot,
                run_id,
                "Finished running client"
            );
            RunOutcome::success(slot, run_id)
        }
        Err(e) => RunOutcome::failure(slot, Some(run_id), e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let write = RunOutcome::success(1, 42);
        assert!(write.succeeded());
        assert_eq!(write.run_id, Some(42));

        let fail = RunOutcome::failure(2, None, "collector returned status 500: boom");
        assert!(!fail.succeeded());
        assert_eq!(fail.client_slot, 2);
    }

    #[test]
    fn test_report_failure_listing() {
        let report = BatchReport {
            protocol: Protocol::Http3,
            parallel_clients: 3,
            outcomes: vec![
                RunOutcome::success(1, 10),
                RunOutcome::failure(2, None, "boom"),
                RunOutcome::success(3, 12),
            ],
        };
        assert!(!report.all_succeeded());
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].client_slot, 2);
    }

    #[test]
    fn test_report_json_shape() {
        let report = BatchReport {
            protocol: Protocol::WebRtc,
            parallel_clients: 1,
            outcomes: vec![RunOutcome::success(1, 7)],
        };
        let json = report.to_json();
        assert_eq!(json["protocol"], "webrtc");
        assert_eq!(json["success"], true);
        assert_eq!(json["outcomes"][0]["run_id"], 7);
    }
}
