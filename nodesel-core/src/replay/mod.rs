//! Replaying recorded branch-and-bound trees under a node selector.

mod engine;
mod trace;
mod tree;

pub use engine::ReplayEngine;
pub use trace::{ReplayStats, ReplayStatus, ReplayTrace, TraceStep};
pub use tree::RecordedTree;
