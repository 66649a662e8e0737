//! Gridpy worker session and execution channel.
//!
//! This crate owns the isolated Python worker: spawning it, speaking the
//! line-delimited JSON request/response protocol with it, and running one
//! task at a time through the full marshal → execute → convert pipeline.
//! The worker persists across tasks (interpreter bootstrap is amortized)
//! but its namespace is reset before every task; hard cancellation kills
//! the process and a fresh one is spawned lazily on next use.

pub mod channel;
pub mod protocol;
pub mod session;

pub use channel::{ChannelState, ExecutionChannel};
pub use protocol::{ExecRequest, WireError, WireResponse};
pub use session::{SessionConfig, WorkerSession};

use gridpy_core::{GridValue, ScriptError};

/// A settled task's successful payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// The validated, grid-safe result value.
    pub value: GridValue,
    /// Everything the script wrote to stdout/stderr, in order.
    pub stdout: String,
}

/// A settled task's failure payload.
///
/// Whatever output was captured before the failure is always carried, so
/// partial diagnostic output is never lost.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    /// The normalized task error.
    pub error: ScriptError,
    /// Output captured before the failure was observed.
    pub stdout: String,
}

impl ExecutionFailure {
    /// Build a failure with no captured output.
    pub fn bare(error: ScriptError) -> Self {
        Self {
            error,
            stdout: String::new(),
        }
    }
}

/// How every task settles.
pub type ExecutionResult = Result<ExecutionOutput, ExecutionFailure>;
