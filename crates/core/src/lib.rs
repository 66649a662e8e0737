//! Gridpy value model and codec.
//!
//! This crate defines the host-facing grid value types, the wire value
//! type returned by the Python worker, the bidirectional codec between
//! them, and the shared error taxonomy. It has no internal dependencies
//! so that every conversion rule is unit-testable without a worker.

pub mod codec;
pub mod error;
pub mod grid;
pub mod wire;

pub use error::ScriptError;
pub use grid::{ArgumentSlots, Cell, GridShapeError, GridValue};
pub use wire::ScriptValue;
