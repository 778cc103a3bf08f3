//! Process-based detector
//!
//! Runs the configured detector command with the image path as its last
//! argument and parses a JSON array of detections from stdout.

use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{PermitError, Result};
use crate::schemas::DetectorConfig;

use super::{BoxFuture, Classifier, Detection};

/// Classifier backed by an external detector executable
#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    config: DetectorConfig,
}

impl ProcessClassifier {
    pub fn new(config: DetectorConfig) -> Self {
        ProcessClassifier { config }
    }

    /// Run the detector on one image file and return its stdout.
    async fn run(&self, image_path: &Path) -> Result<String> {
        let mut child = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(image_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PermitError::Classification(format!(
                    "Failed to spawn detector {}: {}",
                    self.config.command, e
                ))
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = Duration::from_secs(u64::from(self.config.timeout_seconds));

        let result = timeout(limit, async {
            let stdout_handle = tokio::spawn(read_lines(stdout));
            let stderr_handle = tokio::spawn(read_lines(stderr));

            let stdout_output = stdout_handle.await.unwrap_or_default();
            let stderr_output = stderr_handle.await.unwrap_or_default();

            (stdout_output, stderr_output, child.wait().await)
        })
        .await;

        match result {
            Ok((stdout_output, stderr_output, wait_result)) => {
                let status = wait_result.map_err(|e| {
                    PermitError::Classification(format!("Failed to wait for detector: {}", e))
                })?;
                if !status.success() {
                    return Err(PermitError::Classification(format!(
                        "Detector exited with {}: {}",
                        status,
                        stderr_output.trim()
                    )));
                }
                Ok(stdout_output)
            }
            Err(_) => {
                let _ = child.kill().await;
                warn!(command = %self.config.command, "detector timed out");
                Err(PermitError::Classification(format!(
                    "Detector timed out after {}s",
                    self.config.timeout_seconds
                )))
            }
        }
    }

    /// Parse detector stdout and drop low-confidence detections.
    fn parse(&self, stdout: &str) -> Result<Vec<Detection>> {
        let detections: Vec<Detection> = serde_json::from_str(stdout.trim()).map_err(|e| {
            PermitError::Classification(format!("Unreadable detector output: {}", e))
        })?;
        Ok(detections
            .into_iter()
            .filter(|d| d.confidence >= self.config.confidence_threshold)
            .collect())
    }
}

async fn read_lines<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut output = String::new();
    if let Some(pipe) = pipe {
        let mut reader = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

impl Classifier for ProcessClassifier {
    fn detect<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<Vec<Detection>>> {
        Box::pin(async move {
            // Removed when dropped, on every return path
            let mut scratch = tempfile::Builder::new()
                .prefix("permitbot-detect-")
                .suffix(".jpg")
                .tempfile()?;
            scratch.write_all(image)?;
            scratch.flush()?;

            let stdout = self.run(scratch.path()).await?;
            let detections = self.parse(&stdout)?;
            debug!(count = detections.len(), "detector finished");
            Ok(detections)
        })
    }
}
