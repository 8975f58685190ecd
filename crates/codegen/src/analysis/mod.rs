//! Dataflow analyses over lowered methods.

mod liveness;
pub use liveness::{LiveSet, Liveness};

mod interference;
pub use interference::InterferenceGraph;
pub(crate) use interference::lowest_free;
