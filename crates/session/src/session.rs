//! Worker subprocess lifecycle.
//!
//! A [`WorkerSession`] is one long-lived Python interpreter running the
//! embedded harness. It is created lazily, reused across tasks, and
//! discarded outright on fault or hard cancellation — the harness resets
//! its namespace per request, so no task state survives into the next.

use std::process::Stdio;
use std::time::Duration;

use gridpy_core::ScriptError;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::protocol::{ExecRequest, ReadyLine, WireResponse};

/// The Python harness source, executed via `python -u -c`.
const HARNESS_SOURCE: &str = include_str!("harness.py");

/// Upper bound on one response line (result plus captured output).
const MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Configuration for spawning worker sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Python interpreter to spawn (name on PATH or absolute path).
    pub python_bin: String,
    /// How long to wait for the harness ready handshake.
    pub bootstrap_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            bootstrap_timeout: Duration::from_secs(30),
        }
    }
}

/// A live worker subprocess speaking the line-delimited JSON protocol.
pub struct WorkerSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WorkerSession {
    /// Spawn a worker and wait for its ready handshake.
    ///
    /// Fails with [`ScriptError::SessionFault`] if the interpreter
    /// cannot be spawned or does not announce readiness within the
    /// configured timeout — bootstrap failure is fatal to the channel.
    pub async fn spawn(config: &SessionConfig) -> Result<Self, ScriptError> {
        // `-u` keeps the protocol stream unbuffered; the child's stderr fd
        // is nulled because user output is captured inside the harness.
        let mut child = Command::new(&config.python_bin)
            .args(["-u", "-c", HARNESS_SOURCE])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ScriptError::SessionFault(format!(
                    "failed to spawn {}: {e}",
                    config.python_bin
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScriptError::SessionFault("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScriptError::SessionFault("worker stdout unavailable".to_string()))?;
        let mut stdout = BufReader::new(stdout);

        let mut line = String::new();
        let read = tokio::time::timeout(config.bootstrap_timeout, stdout.read_line(&mut line))
            .await
            .map_err(|_| {
                ScriptError::SessionFault(format!(
                    "worker did not become ready within {:?}",
                    config.bootstrap_timeout
                ))
            })?
            .map_err(|e| ScriptError::SessionFault(format!("worker handshake failed: {e}")))?;
        if read == 0 {
            return Err(ScriptError::SessionFault(
                "worker exited before handshake".to_string(),
            ));
        }
        let ready: ReadyLine = serde_json::from_str(line.trim()).map_err(|e| {
            ScriptError::SessionFault(format!("malformed handshake line: {e}"))
        })?;
        if !ready.ready {
            return Err(ScriptError::SessionFault(
                "worker announced not-ready".to_string(),
            ));
        }

        tracing::debug!(python = %config.python_bin, "worker session ready");

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }

    /// Send one request and read one response line.
    ///
    /// Any pipe or framing failure faults the session; the caller must
    /// discard it.
    pub async fn execute(&mut self, request: &ExecRequest) -> Result<WireResponse, ScriptError> {
        let mut frame = serde_json::to_string(request)
            .map_err(|e| ScriptError::SessionFault(format!("request encoding failed: {e}")))?;
        frame.push('\n');

        self.stdin
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| ScriptError::SessionFault(format!("worker pipe write failed: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| ScriptError::SessionFault(format!("worker pipe flush failed: {e}")))?;

        let mut line = String::new();
        let read = (&mut self.stdout)
            .take(MAX_RESPONSE_BYTES)
            .read_line(&mut line)
            .await
            .map_err(|e| ScriptError::SessionFault(format!("worker pipe read failed: {e}")))?;
        if read == 0 {
            return Err(ScriptError::SessionFault(
                "worker exited mid-request".to_string(),
            ));
        }
        // A line that never terminated means either the worker died
        // mid-write or the response exceeded the size cap.
        if !line.ends_with('\n') {
            return Err(ScriptError::SessionFault(format!(
                "worker response truncated or larger than {MAX_RESPONSE_BYTES} bytes"
            )));
        }

        serde_json::from_str(line.trim())
            .map_err(|e| ScriptError::SessionFault(format!("malformed worker response: {e}")))
    }

    /// Kill the worker process without waiting for it.
    ///
    /// Used for hard cancellation: a mid-script worker cannot be trusted
    /// to observe a cooperative flag, so the whole session is torn down
    /// and recreated lazily on next use.
    pub fn kill(mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("worker kill failed (already exited?): {e}");
        }
    }
}
