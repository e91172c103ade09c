//! Replay results.

use serde::{Deserialize, Serialize};

use crate::numerics::bound_serde;
use crate::oracle::{PolicyDiagnostics, Verdict};
use crate::search::NodeId;

/// Why a replay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStatus {
    /// Every recorded node was expanded.
    Exhausted,

    /// A consistent node without children was expanded.
    ReferenceReached,

    /// Node limit reached.
    NodeLimit,
}

/// One expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    /// Expanded node.
    pub node: NodeId,

    /// Its depth.
    pub depth: usize,

    /// Its lower bound.
    #[serde(with = "bound_serde")]
    pub lower_bound: f64,

    /// Selector verdict at expansion time, if the selector classifies.
    pub verdict: Option<Verdict>,

    /// Whether the node was picked by the selector rather than the engine.
    pub chosen_by_selector: bool,
}

/// Statistics of a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Instance name.
    pub instance: String,

    /// Selector method name.
    pub method: String,

    /// Stop reason.
    pub status: ReplayStatus,

    /// Nodes expanded.
    pub nodes_expanded: u64,

    /// Nodes still open at the end.
    pub nodes_open: u64,

    /// Recorded nodes never opened.
    pub nodes_unreached: u64,

    /// Expanded nodes the selector marked consistent.
    pub consistent_expanded: u64,

    /// Expansion count at which the reference leaf was reached.
    pub reference_reached_at: Option<u64>,

    /// Wall time in milliseconds.
    pub elapsed_ms: u64,

    /// Oracle diagnostics, for oracle selectors.
    pub oracle: Option<PolicyDiagnostics>,
}

/// Expansion order and statistics of one replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayTrace {
    /// Summary.
    pub stats: ReplayStats,

    /// Expansions in order.
    pub steps: Vec<TraceStep>,
}

impl ReplayTrace {
    /// Node ids in expansion order.
    pub fn order(&self) -> Vec<NodeId> {
        self.steps.iter().map(|s| s.node).collect()
    }

    /// Expanded nodes the selector marked consistent, in order. For the
    /// oracle this is the path from the root toward the reference leaf.
    pub fn consistent_path(&self) -> Vec<NodeId> {
        self.steps
            .iter()
            .filter(|s| s.verdict == Some(Verdict::Consistent))
            .map(|s| s.node)
            .collect()
    }
}
