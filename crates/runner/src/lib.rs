//! Gridpy orchestration facade.
//!
//! The single public entry point for the host: resolve a code reference,
//! submit it to the task queue, and always hand back a renderable grid
//! value — failures become a single-cell placeholder plus out-of-band
//! console events.

pub mod config;
pub mod resolver;
pub mod runner;

pub use config::RunnerConfig;
pub use resolver::{CodeResolver, DefaultResolver, HttpResolver, InlineResolver};
pub use runner::ScriptRunner;
