//! Gridpy single-concurrency task queue.
//!
//! Admits tasks in arrival order, runs at most one at a time, and
//! supports whole-pipeline cancellation. The single slot is a deliberate
//! backpressure policy: the host serializes document mutations, so
//! concurrent script executions would race on shared external state.

pub mod queue;

pub use queue::{Task, TaskQueue};
