//! xfer-bench: transport-protocol experiment suite
//!
//! Coordinates parallel external test-client runs against a remote
//! metrics collector, and normalizes the collector's CSV export into an
//! analysis-ready dataset.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use xfer_bench_common::defaults::{
    default_reruns, DEFAULT_CLEAN_TABLE, DEFAULT_RAW_TABLE, DEFAULT_SLOT_TIMEOUT,
};
use xfer_bench_common::{Protocol, TimeSlot};
use xfer_bench_suite::clean;
use xfer_bench_suite::collector::CollectorClient;
use xfer_bench_suite::config::{
    BatchConfig, CollectorConfig, ExperimentConfig, RunConfig, RuntimeFlags,
};
use xfer_bench_suite::coordinator::{run_batch, BatchReport};
use xfer_bench_suite::launcher::ClientLauncher;

#[derive(Parser, Debug)]
#[command(name = "xfer-bench")]
#[command(about = "Transport-protocol experiment suite")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the run command
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Comma-separated protocols to test (http3, webtransport, websockets, webrtc)
    #[arg(short, long)]
    protocols: String,

    /// Comma-separated parallel-client counts per protocol
    #[arg(long, default_value = "1")]
    parallel: String,

    /// Time slot label (morning, afternoon, evening, night)
    #[arg(short, long)]
    time_slot: TimeSlot,

    /// Run against a local server instead of the remote environment
    #[arg(short, long)]
    local: bool,

    /// Directory holding the protocol-named client directories
    #[arg(long, default_value = "..")]
    client_root: PathBuf,

    /// Base URL of the metrics collector
    #[arg(long, env = "COLLECTOR_URL")]
    collector_url: String,

    /// Pre-shared collector API key
    #[arg(long, env = "COLLECTOR_API_KEY")]
    api_key: String,

    /// Batch repetitions per configuration (default: rerun schedule)
    #[arg(long)]
    reruns: Option<u32>,

    /// Per-slot timeout in seconds (0 disables)
    #[arg(long, default_value_t = DEFAULT_SLOT_TIMEOUT)]
    slot_timeout: u64,

    /// Output JSON file for the session report
    #[arg(short, long)]
    output: Option<String>,
}

impl RunArgs {
    fn parse_protocols(&self) -> Result<Vec<Protocol>> {
        self.protocols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Protocol::from_str(s).with_context(|| format!("invalid protocol: {s}")))
            .collect()
    }

    fn parse_parallel_counts(&self) -> Result<Vec<u32>> {
        self.parallel
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .with_context(|| format!("invalid parallel-client count: {s}"))
            })
            .collect()
    }

    fn into_config(self) -> Result<RunConfig> {
        let protocols = self.parse_protocols()?;
        let parallel_counts = self.parse_parallel_counts()?;
        Ok(RunConfig {
            collector: CollectorConfig {
                base_url: self.collector_url,
                api_key: self.api_key,
            },
            experiment: ExperimentConfig {
                protocols,
                parallel_counts,
                time_slot: self.time_slot,
                local: self.local,
                reruns: self.reruns,
            },
            flags: RuntimeFlags {
                client_root: self.client_root,
                slot_timeout: self.slot_timeout,
                output: self.output,
            },
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run test batches for an experiment matrix
    Run(Box<RunArgs>),

    /// Normalize a raw collector export into an analysis-ready table
    Clean {
        /// Raw results table from the collector
        #[arg(short, long, default_value = DEFAULT_RAW_TABLE)]
        input: PathBuf,

        /// Normalized output table
        #[arg(short, long, default_value = DEFAULT_CLEAN_TABLE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Run(run_args) => {
            let config = run_args.into_config()?;
            info!(
                protocols = ?config.experiment.protocols,
                parallel = ?config.experiment.parallel_counts,
                time_slot = %config.experiment.time_slot,
                local = config.experiment.local,
                "Starting experiment session"
            );
            run_experiments(config).await
        }
        Command::Clean { input, output } => {
            let report = clean::clean(&input, &output)?;
            println!(
                "Normalized {} of {} rows into {}",
                report.rows_written,
                report.rows_read,
                output.display()
            );
            if !report.diagnostics.is_empty() {
                println!("Skipped {} malformed rows:", report.diagnostics.len());
                for diagnostic in &report.diagnostics {
                    println!("  line {}: {}", diagnostic.line, diagnostic.message);
                }
            }
            Ok(())
        }
    }
}

/// Iterate the experiment matrix: protocols x parallel counts x reruns.
async fn run_experiments(config: RunConfig) -> Result<()> {
    let collector = CollectorClient::new(&config.collector);
    let cancel = CancellationToken::new();

    // Ctrl-C cancels running slots; the session stops after the batch.
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling running clients");
            cancel_on_signal.cancel();
        }
    });

    let started_at = chrono::Utc::now();
    let mut reports: Vec<BatchReport> = Vec::new();

    'session: for &protocol in &config.experiment.protocols {
        info!(protocol = %protocol, "Running tests for protocol");
        let launcher = ClientLauncher::new(protocol, &config.flags.client_root);

        for &parallel_clients in &config.experiment.parallel_counts {
            let reruns = config
                .experiment
                .reruns
                .unwrap_or_else(|| default_reruns(parallel_clients));

            for attempt in 1..=reruns {
                if cancel.is_cancelled() {
                    warn!("Session cancelled, stopping");
                    break 'session;
                }

                info!(
                    protocol = %protocol,
                    parallel_clients,
                    attempt,
                    reruns,
                    "Running batch"
                );

                let batch = BatchConfig {
                    protocol,
                    time_slot: config.experiment.time_slot,
                    local: config.experiment.local,
                    parallel_clients,
                    slot_timeout: config.flags.slot_timeout,
                };
                let report = run_batch(&collector, &launcher, &batch, &cancel).await;
                println!("{}", report.summary_table());
                reports.push(report);
            }
        }
    }

    if let Some(output_path) = &config.flags.output {
        let session = serde_json::json!({
            "started_at": started_at.to_rfc3339(),
            "time_slot": config.experiment.time_slot.to_string(),
            "local": config.experiment.local,
            "success": reports.iter().all(BatchReport::all_succeeded),
            "batches": reports.iter().map(BatchReport::to_json).collect::<Vec<_>>(),
        });
        std::fs::write(output_path, serde_json::to_string_pretty(&session)?)
            .with_context(|| format!("failed to write session report {output_path}"))?;
        info!(path = %output_path, "Session report written");
    }

    let failed_batches = reports.iter().filter(|r| !r.all_succeeded()).count();
    if failed_batches > 0 {
        warn!(failed_batches, total = reports.len(), "Session finished with failures");
    } else {
        info!(total = reports.len(), "Session finished, all batches succeeded");
    }
    Ok(())
}
