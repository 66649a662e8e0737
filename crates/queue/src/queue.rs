//! FIFO scheduler with one in-flight task and hard cancellation.
//!
//! One spawned scheduler loop exclusively owns the [`ExecutionChannel`],
//! which gives mutual exclusion over the worker session by construction.
//! Cancellation uses a master [`CancellationToken`] with a child token
//! per task: `cancel_all` cancels the master (settling every pending and
//! in-flight task) and re-arms a fresh one so later submissions run
//! normally.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use gridpy_core::{ArgumentSlots, ScriptError};
use gridpy_session::{ExecutionChannel, ExecutionFailure, ExecutionResult, SessionConfig};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One unit of work, owned by the queue from admission to settlement.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique task id, used in logs.
    pub id: Uuid,
    /// The script text to execute.
    pub code: String,
    /// Positional argument slots, if any.
    pub argument: Option<ArgumentSlots>,
    /// When the task was admitted (UTC).
    pub submitted_at: DateTime<Utc>,
}

struct QueuedTask {
    task: Task,
    cancel: CancellationToken,
    reply: oneshot::Sender<ExecutionResult>,
}

/// Single-concurrency FIFO task queue.
///
/// Create one per execution channel via [`TaskQueue::start`]; share it
/// via `Arc`.
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<QueuedTask>,
    cancel: Mutex<CancellationToken>,
}

impl TaskQueue {
    /// Spawn the scheduler loop and return the queue handle.
    pub fn start(config: SessionConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel = ExecutionChannel::new(config);
        tokio::spawn(scheduler_loop(rx, channel));
        Self {
            tx,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Admit a task now and return a future that settles with its result.
    ///
    /// Admission is synchronous: the task is in the queue (and covered by
    /// the current cancellation scope) before this returns. Tasks execute
    /// in strict submission order, one at a time.
    pub fn enqueue(
        &self,
        code: impl Into<String>,
        argument: Option<ArgumentSlots>,
    ) -> impl std::future::Future<Output = ExecutionResult> + Send + 'static {
        let task = Task {
            id: Uuid::new_v4(),
            code: code.into(),
            argument,
            submitted_at: Utc::now(),
        };
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .child_token();
        let (reply_tx, reply_rx) = oneshot::channel();

        tracing::debug!(task_id = %task.id, "task admitted");

        let queued = QueuedTask {
            task,
            cancel: cancel.clone(),
            reply: reply_tx,
        };
        // A send error means the scheduler loop is gone (process teardown).
        let admitted = self.tx.send(queued).is_ok();

        async move {
            if !admitted {
                return Err(ExecutionFailure::bare(ScriptError::Cancelled));
            }
            // Settle immediately on cancellation — a queued-but-not-started
            // task must never wait for the in-flight one to be torn down.
            tokio::select! {
                _ = cancel.cancelled() => Err(ExecutionFailure::bare(ScriptError::Cancelled)),
                settled = reply_rx => {
                    settled.unwrap_or_else(|_| Err(ExecutionFailure::bare(ScriptError::Cancelled)))
                }
            }
        }
    }

    /// Enqueue a task and await its settlement.
    pub async fn submit(
        &self,
        code: impl Into<String>,
        argument: Option<ArgumentSlots>,
    ) -> ExecutionResult {
        self.enqueue(code, argument).await
    }

    /// Cancel every pending and in-flight task.
    ///
    /// The in-flight worker session is killed hard (not cooperatively)
    /// and recreated lazily on next use; queued tasks settle `Cancelled`
    /// without ever starting. Tasks submitted after this call run
    /// normally.
    pub fn cancel_all(&self) {
        let mut guard = self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.cancel();
        *guard = CancellationToken::new();
        tracing::info!("all tasks cancelled");
    }
}

/// The scheduler loop: one task at a time, in arrival order.
///
/// A task's own error never stops the loop; only dropping the queue
/// handle (closing the channel) does.
async fn scheduler_loop(
    mut rx: mpsc::UnboundedReceiver<QueuedTask>,
    mut channel: ExecutionChannel,
) {
    while let Some(queued) = rx.recv().await {
        if queued.cancel.is_cancelled() {
            // Settled on the submitter's side already; never start it.
            let _ = queued
                .reply
                .send(Err(ExecutionFailure::bare(ScriptError::Cancelled)));
            continue;
        }

        let QueuedTask {
            task,
            cancel,
            reply,
        } = queued;

        tracing::debug!(task_id = %task.id, "task started");
        let result = channel
            .run_task(&task.code, task.argument.as_ref(), &cancel)
            .await;
        match &result {
            Ok(_) => tracing::debug!(task_id = %task.id, "task settled: ok"),
            Err(failure) => tracing::debug!(
                task_id = %task.id,
                kind = failure.error.kind(),
                "task settled: error"
            ),
        }
        // The submitter may have gone away (e.g. settled via cancel).
        let _ = reply.send(result);
    }
}
