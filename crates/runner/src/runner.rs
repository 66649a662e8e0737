//! The orchestration facade.
//!
//! [`ScriptRunner::invoke`] is the caller-facing contract: it always
//! returns a well-formed grid value. Failures become a single-cell
//! placeholder plus `error` events on the bus; diagnostic output
//! produced before a failure is emitted as a separate `log` event, since
//! it is often the only debugging signal the caller has.

use std::sync::Arc;

use gridpy_core::{ArgumentSlots, Cell, GridValue};
use gridpy_events::EventBus;
use gridpy_queue::TaskQueue;

use crate::config::RunnerConfig;
use crate::resolver::{CodeResolver, DefaultResolver};

/// The terse caller-visible failure value; full detail goes to the bus.
const ERROR_PLACEHOLDER: &str = "Error, see output log for details.";

/// Ties source resolution, queue submission, and event emission together.
pub struct ScriptRunner {
    resolver: Arc<dyn CodeResolver>,
    queue: TaskQueue,
    events: Arc<EventBus>,
}

impl ScriptRunner {
    /// Build a runner with the default resolver (inline + HTTPS).
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_resolver(config, Arc::new(DefaultResolver::new()))
    }

    /// Build a runner with a host-specific code resolver.
    pub fn with_resolver(config: RunnerConfig, resolver: Arc<dyn CodeResolver>) -> Self {
        let events = Arc::new(EventBus::new(config.event_capacity));
        let queue = TaskQueue::start(config.session);
        Self {
            resolver,
            queue,
            events,
        }
    }

    /// The console event bus; subscribe to receive log/error events.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Cancel every pending and in-flight task.
    pub fn cancel_all(&self) {
        self.queue.cancel_all();
    }

    /// Resolve, execute, and convert one invocation.
    ///
    /// Never fails past this boundary: the caller receives either the
    /// script's grid value or a single-cell placeholder, with full
    /// failure detail emitted as events.
    pub async fn invoke(&self, reference: &str, argument: Option<ArgumentSlots>) -> GridValue {
        let code = match self.resolver.resolve(reference).await {
            Ok(code) => code,
            Err(error) => {
                tracing::warn!(kind = error.kind(), "code resolution failed");
                self.events.error(error.to_string());
                return error_placeholder();
            }
        };

        match self.queue.submit(code, argument).await {
            Ok(output) => {
                let stdout = output.stdout.trim();
                if !stdout.is_empty() {
                    self.events.log(stdout);
                }
                output.value
            }
            Err(failure) => {
                tracing::warn!(kind = failure.error.kind(), "task failed");
                let stdout = failure.stdout.trim();
                if !stdout.is_empty() {
                    self.events.log(stdout);
                }
                self.events.error(failure.error.to_string());
                error_placeholder()
            }
        }
    }
}

/// The single-cell grid returned for any failure.
fn error_placeholder() -> GridValue {
    GridValue::scalar(Cell::Text(ERROR_PLACEHOLDER.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
