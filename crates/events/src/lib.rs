//! Gridpy console event infrastructure.
//!
//! Scripts produce two kinds of out-of-band output: captured
//! stdout/stderr text and terminal failure messages. Both flow through
//! the in-process [`EventBus`] as fire-and-forget notifications — sink
//! availability never affects task completion.

pub mod bus;

pub use bus::{ConsoleEvent, ConsoleEventKind, EventBus};
