//! External test-client process launching
//!
//! Each protocol ships its client as a sibling directory next to the
//! suite (`http3-client`, `webrtc-client`, ...). The launcher builds the
//! process invocation for a protocol, runs it to completion and checks
//! the exit status. The client is expected to do the actual transfer and
//! to report its metrics to the collector on its own; its stdout/stderr
//! are inherited, not interpreted.
//!
//! Invocation convention: `-r<runID>`, plus a trailing `-l` for
//! local-environment runs. The WebRTC client is a Node script
//! (`node main.js -r<runID> [-l]`); the rest are native binaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use xfer_bench_common::Protocol;

/// A client process that could not be run to a clean exit
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn client process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for client process: {0}")]
    Wait(#[from] std::io::Error),

    /// The client ran but exited non-zero
    #[error("client process failed with {status}")]
    ClientProcessFailed { status: std::process::ExitStatus },

    #[error("client process timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    #[error("client run cancelled")]
    Cancelled,
}

/// Builds and runs one external test-client process per call.
#[derive(Debug, Clone)]
pub struct ClientLauncher {
    protocol: Protocol,
    client_dir: PathBuf,
}

impl ClientLauncher {
    /// Launcher for `protocol`, rooted at the directory holding the
    /// protocol-named client directories.
    pub fn new(protocol: Protocol, client_root: &Path) -> Self {
        Self {
            protocol,
            client_dir: client_root.join(protocol.client_dir_name()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The program and arguments for one run, without spawning.
    fn invocation(&self, run_id: i64, local: bool) -> (PathBuf, Vec<String>) {
        let mut args = Vec::new();
        let program = if self.protocol.uses_script_host() {
            args.push("main.js".to_string());
            PathBuf::from("node")
        } else {
            self.client_dir.join("app")
        };

        args.push(format!("-r{run_id}"));
        if local {
            args.push("-l".to_string());
        }
        (program, args)
    }

    /// Run the client process and wait for it to exit.
    ///
    /// The wait is bounded by `timeout_secs` (0 disables the bound) and
    /// by the cancellation token; both kill the process before
    /// returning. A non-zero exit is an error: the original suite
    /// trusted the client blindly here, which silently swallowed client
    /// crashes.
    pub async fn run(
        &self,
        run_id: i64,
        local: bool,
        timeout_secs: u64,
        cancel: &CancellationToken,
    ) -> Result<(), LaunchError> {
        let (program, args) = self.invocation(run_id, local);
        info!(
            protocol = %self.protocol,
            run_id,
            program = %program.display(),
            args = ?args,
            "Launching test client"
        );

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.client_dir)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let deadline = async {
            if timeout_secs == 0 {
                std::future::pending::<()>().await
            } else {
                tokio::time::sleep(Duration::from_secs(timeout_secs)).await
            }
        };
        tokio::pin!(deadline);

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                warn!(protocol = %self.protocol, run_id, "Run cancelled, killing client process");
                let _ = child.kill().await;
                return Err(LaunchError::Cancelled);
            }
            _ = &mut deadline => {
                warn!(
                    protocol = %self.protocol,
                    run_id,
                    timeout_secs,
                    "Client process timed out, killing it"
                );
                let _ = child.kill().await;
                return Err(LaunchError::TimedOut { timeout_secs });
            }
        };

        if !status.success() {
            return Err(LaunchError::ClientProcessFailed { status });
        }

        info!(protocol = %self.protocol, run_id, "Test client finished");
        Ok(())
    }
}
