//! Search tree nodes and the engine interface.

mod engine;
mod frontier;
mod node;

pub use engine::SearchEngine;
pub use frontier::Frontier;
pub use node::{BoundDirection, BranchingDecision, NodeId, SearchNode, VarId};
