//! Shared error taxonomy for the execution pipeline.

/// Every way a task can fail, from source resolution through result
/// conversion.
///
/// All variants are task-level and recoverable — the queue keeps
/// processing after any of them — except [`SessionFault`], which marks
/// the worker session as corrupted and forces a re-bootstrap on the
/// next task.
///
/// [`SessionFault`]: ScriptError::SessionFault
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScriptError {
    /// The code reference could not be resolved to script text.
    #[error("Failed to resolve code source: {0}")]
    SourceResolution(String),

    /// A dependency referenced by the script could not be installed.
    /// The session remains usable.
    #[error("Failed to install dependencies: {0}")]
    DependencyInstall(String),

    /// The script raised or threw during execution.
    #[error("{0}")]
    ScriptRuntime(String),

    /// The script produced nothing usable. Two detection paths share
    /// this kind: a `None`/missing result, and an empty list result.
    #[error("{0}")]
    EmptyResult(String),

    /// An element of a returned sequence is not a supported scalar.
    #[error("All elements must be scalar types (int, float, str, bool)")]
    InvalidElementType,

    /// A returned nested sequence has rows of unequal length.
    #[error("All rows must have the same length")]
    RowLengthMismatch,

    /// The returned value has a shape the grid cannot render.
    #[error("{0}")]
    UnsupportedResultType(String),

    /// The task was cancelled before or during execution.
    #[error("Execution cancelled")]
    Cancelled,

    /// The worker session is corrupted or could not be bootstrapped.
    /// The session is discarded and recreated lazily on next use.
    #[error("Worker session failed: {0}")]
    SessionFault(String),
}

impl ScriptError {
    /// Stable machine-readable kind label, used in events and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceResolution(_) => "source_resolution",
            Self::DependencyInstall(_) => "dependency_install",
            Self::ScriptRuntime(_) => "script_runtime",
            Self::EmptyResult(_) => "empty_result",
            Self::InvalidElementType => "invalid_element_type",
            Self::RowLengthMismatch => "row_length_mismatch",
            Self::UnsupportedResultType(_) => "unsupported_result_type",
            Self::Cancelled => "cancelled",
            Self::SessionFault(_) => "session_fault",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
