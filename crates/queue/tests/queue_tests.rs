//! Integration tests for queue ordering, cancellation, and error
//! isolation against a real Python interpreter. Tests skip themselves
//! when `python3` is not on PATH.

use std::sync::Arc;

use assert_matches::assert_matches;
use gridpy_core::{Cell, GridValue, ScriptError};
use gridpy_queue::TaskQueue;
use gridpy_session::SessionConfig;

async fn python_available() -> bool {
    tokio::process::Command::new("python3")
        .arg("--version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[tokio::test]
async fn tasks_execute_in_submission_order() {
    if !python_available().await {
        return;
    }
    let queue = Arc::new(TaskQueue::start(SessionConfig::default()));

    let mut handles = Vec::new();
    for i in 0..3 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            queue.submit(format!("result = {i}"), None).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let output = handle.await.unwrap().expect("task should succeed");
        assert_eq!(output.value, GridValue::scalar(Cell::Number(i as f64)));
    }
}

#[tokio::test]
async fn cancel_all_settles_every_task_without_running_queued_code() {
    if !python_available().await {
        return;
    }
    let queue = Arc::new(TaskQueue::start(SessionConfig::default()));

    // Three slow tasks; none can complete before the cancel below.
    let mut handles = Vec::new();
    for _ in 0..3 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            queue
                .submit("import time\ntime.sleep(60)\nresult = 1", None)
                .await
        }));
    }

    // Give the first task a moment to reach the worker, then abort.
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    queue.cancel_all();

    for handle in handles {
        let result = handle.await.unwrap();
        let failure = result.expect_err("every task should settle cancelled");
        assert_matches!(failure.error, ScriptError::Cancelled);
    }
}

#[tokio::test]
async fn immediate_cancel_all_prevents_any_code_from_running() {
    if !python_available().await {
        return;
    }
    let queue = Arc::new(TaskQueue::start(SessionConfig::default()));
    let marker = std::env::temp_dir().join(format!("gridpy-cancel-{}.marker", uuid::Uuid::new_v4()));

    // Each task would drop a marker file as its very first statement.
    let code = format!(
        "open({:?}, 'w').write('ran')\nimport time\ntime.sleep(60)\nresult = 1",
        marker.to_string_lossy()
    );
    // `enqueue` admits synchronously, so all three tasks are in scope
    // before the cancel below — no timing window.
    let settlements: Vec<_> = (0..3).map(|_| queue.enqueue(code.clone(), None)).collect();
    queue.cancel_all();

    for settlement in settlements {
        let failure = settlement.await.expect_err("task should settle cancelled");
        assert_matches!(failure.error, ScriptError::Cancelled);
    }
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(!marker.exists(), "cancelled task code must never execute");
}

#[tokio::test]
async fn queue_keeps_processing_after_cancel_all() {
    if !python_available().await {
        return;
    }
    let queue = Arc::new(TaskQueue::start(SessionConfig::default()));

    let slow = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            queue
                .submit("import time\ntime.sleep(60)\nresult = 1", None)
                .await
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    queue.cancel_all();
    assert!(slow.await.unwrap().is_err());

    // Submitted after cancel_all: must run on a fresh session.
    let output = queue
        .submit("result = 'alive'", None)
        .await
        .expect("queue should stay usable after cancel_all");
    assert_eq!(output.value, GridValue::scalar(Cell::Text("alive".to_string())));
}

#[tokio::test]
async fn one_task_error_does_not_affect_the_next() {
    if !python_available().await {
        return;
    }
    let queue = TaskQueue::start(SessionConfig::default());

    let failure = queue
        .submit("raise RuntimeError('bad task')", None)
        .await
        .expect_err("raising task should fail");
    assert_matches!(failure.error, ScriptError::ScriptRuntime(_));

    let output = queue
        .submit("result = 2", None)
        .await
        .expect("queue should process the next task");
    assert_eq!(output.value, GridValue::scalar(Cell::Number(2.0)));
}
