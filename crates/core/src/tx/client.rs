//! Asynchronous wrapper around the Transifex `tx` client.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::errors::TxError;
use crate::tx_config::ResourceKey;

/// Runs `tx` subcommands from the repository root.
#[derive(Debug, Clone)]
pub struct TxClient {
    binary: String,
    work_dir: PathBuf,
    timeout: Duration,
}

impl TxClient {
    /// Create a client invoking `binary` inside `work_dir`, bounding every
    /// command by `timeout`.
    pub fn new(binary: impl Into<String>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        let client = Self { binary: binary.into(), work_dir: work_dir.into(), timeout };
        info!(binary = %client.binary, work_dir = %client.work_dir.display(), "created TxClient");
        client
    }

    pub fn binary(&self) -> &str { &self.binary }

    /// Push the source file of one resource. Returns the captured stdout.
    #[instrument(skip(self), fields(push_target = %key.push_target()))]
    pub async fn push(&self, key: &ResourceKey) -> Result<String, TxError> {
        let target = key.push_target();
        let output = self.run_tx(&["push", &target]).await?;
        info!(resource = %key.resource, project = %key.project, "tx push completed");
        Ok(output)
    }

    async fn run_tx(&self, args: &[&str]) -> Result<String, TxError> {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&self.work_dir)
            .args(args)
            .stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(cmd = ?format!("{} {}", self.binary, args.join(" ")), "running tx command");
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { TxError::BinaryNotFound(self.binary.clone()) }
                else { TxError::IoError(e) }
            })?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "tx command timed out");
                return Err(TxError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "tx command failed");
            return Err(TxError::CommandFailed { exit_code, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
