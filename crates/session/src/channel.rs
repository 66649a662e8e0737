//! The execution channel: one task at a time through the worker.
//!
//! Owns the (lazily created) [`WorkerSession`] exclusively. Mutual
//! exclusion is guaranteed by the task queue's single-slot invariant,
//! not by locking here.

use gridpy_core::codec;
use gridpy_core::{ArgumentSlots, ScriptError, ScriptValue};
use tokio_util::sync::CancellationToken;

use crate::protocol::ExecRequest;
use crate::session::{SessionConfig, WorkerSession};
use crate::{ExecutionFailure, ExecutionOutput, ExecutionResult};

/// Observable channel state, advanced as a task moves through the
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No task in flight.
    Idle,
    /// Bootstrapping the worker session.
    Preparing,
    /// Marshaling arguments into the request payload.
    Marshaling,
    /// The script is executing in the worker.
    Running,
    /// Validating/converting the script's result.
    Converting,
    /// The session is corrupted; the next task re-bootstraps.
    Faulted,
}

/// Runs tasks to completion inside the isolated worker session.
pub struct ExecutionChannel {
    config: SessionConfig,
    session: Option<WorkerSession>,
    state: ChannelState,
}

impl ExecutionChannel {
    /// Create a channel; the worker is not spawned until the first task.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: None,
            state: ChannelState::Idle,
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Whether a live worker session currently exists.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Run one task's code to completion.
    ///
    /// `cancel` aborts the task at any point: the worker is killed hard,
    /// the session is discarded, and the task settles with
    /// [`ScriptError::Cancelled`].
    pub async fn run_task(
        &mut self,
        code: &str,
        argument: Option<&ArgumentSlots>,
        cancel: &CancellationToken,
    ) -> ExecutionResult {
        if cancel.is_cancelled() {
            return Err(ExecutionFailure::bare(ScriptError::Cancelled));
        }

        self.state = ChannelState::Preparing;
        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                tracing::debug!("bootstrapping worker session");
                let spawn = WorkerSession::spawn(&self.config);
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.state = ChannelState::Faulted;
                        return Err(ExecutionFailure::bare(ScriptError::Cancelled));
                    }
                    spawned = spawn => match spawned {
                        Ok(session) => session,
                        Err(e) => {
                            self.state = ChannelState::Faulted;
                            return Err(ExecutionFailure::bare(e));
                        }
                    }
                }
            }
        };

        self.state = ChannelState::Marshaling;
        let request = ExecRequest {
            code: code.to_string(),
            args: codec::marshal_argument(argument),
        };

        self.state = ChannelState::Running;
        let response = tokio::select! {
            _ = cancel.cancelled() => None,
            response = session.execute(&request) => Some(response),
        };
        let Some(response) = response else {
            tracing::debug!("task cancelled mid-run; killing worker session");
            session.kill();
            self.state = ChannelState::Faulted;
            return Err(ExecutionFailure::bare(ScriptError::Cancelled));
        };

        let wire = match response {
            Ok(wire) => wire,
            Err(fault) => {
                // The pipe is broken; the session cannot be trusted.
                session.kill();
                self.state = ChannelState::Faulted;
                return Err(ExecutionFailure::bare(fault));
            }
        };

        // The session survived the request; keep it for the next task.
        self.session = Some(session);

        if let Some(error) = wire.error {
            self.state = ChannelState::Idle;
            let error = match error.kind.as_str() {
                "dependency" => ScriptError::DependencyInstall(error.message),
                _ => ScriptError::ScriptRuntime(error.message),
            };
            return Err(ExecutionFailure {
                error,
                stdout: wire.stdout,
            });
        }

        self.state = ChannelState::Converting;
        let value = wire.result.unwrap_or(serde_json::Value::Null);
        let converted = codec::convert_result(&ScriptValue::from_wire(&value));
        self.state = ChannelState::Idle;
        match converted {
            Ok(grid) => Ok(ExecutionOutput {
                value: grid,
                stdout: wire.stdout,
            }),
            Err(error) => Err(ExecutionFailure {
                error,
                stdout: wire.stdout,
            }),
        }
    }

    /// Discard the current session, if any, killing its worker.
    ///
    /// The next task re-bootstraps lazily.
    pub fn discard_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.kill();
            self.state = ChannelState::Faulted;
        }
    }
}
