//! Wire protocol with the worker harness.
//!
//! One JSON object per line in each direction. The worker announces
//! readiness once after bootstrap, then answers exactly one response
//! line per request line, always carrying captured output.

use serde::{Deserialize, Serialize};

/// A request to execute one script.
#[derive(Debug, Clone, Serialize)]
pub struct ExecRequest {
    /// The script text to execute.
    pub code: String,
    /// Marshaled argument slots, bound as `arg1..argN` in the worker.
    /// `None` means the task carried no argument payload at all.
    pub args: Option<Vec<serde_json::Value>>,
}

/// The handshake line the harness writes once it is ready for requests.
#[derive(Debug, Deserialize)]
pub struct ReadyLine {
    pub ready: bool,
}

/// An error reported by the harness for one request.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    /// `"runtime"` for script exceptions, `"dependency"` for package
    /// installation failures.
    #[serde(default)]
    pub kind: String,
    pub message: String,
}

/// One response line from the harness.
///
/// Exactly one of `result` / `error` is populated; `stdout` is always
/// present (possibly empty).
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<WireError>,
    #[serde(default)]
    pub stdout: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
