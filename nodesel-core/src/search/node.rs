//! Search node representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::numerics::bound_serde;

/// Engine-assigned node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a decision variable in the instance's variable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub usize);

/// Which side of the domain a branching decision tightens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundDirection {
    /// New lower bound: x >= bound.
    Lower,

    /// New upper bound: x <= bound.
    Upper,
}

/// A single bound restriction imposed by one branching step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchingDecision {
    /// Variable branched on.
    pub var: VarId,

    /// Imposed bound value.
    #[serde(with = "bound_serde")]
    pub bound: f64,

    /// Bound direction.
    pub direction: BoundDirection,
}

impl BranchingDecision {
    /// Create an "up" branch: x >= bound.
    pub fn lower(var: VarId, bound: f64) -> Self {
        Self {
            var,
            bound,
            direction: BoundDirection::Lower,
        }
    }

    /// Create a "down" branch: x <= bound.
    pub fn upper(var: VarId, bound: f64) -> Self {
        Self {
            var,
            bound,
            direction: BoundDirection::Upper,
        }
    }

    /// Check whether `value` violates this decision.
    ///
    /// Only strict violations count; a value sitting exactly on the bound
    /// satisfies the decision.
    pub fn is_violated_by(&self, value: f64) -> bool {
        match self.direction {
            BoundDirection::Lower => value < self.bound,
            BoundDirection::Upper => value > self.bound,
        }
    }
}

/// A node in the B&B search tree, as seen by node selectors.
///
/// Owned by the engine; selectors only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNode {
    /// Unique node identifier.
    pub id: NodeId,

    /// Parent node ID (None for root).
    #[serde(default)]
    pub parent: Option<NodeId>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// Branching decisions accumulated from the root to this node.
    #[serde(default)]
    pub branchings: Vec<BranchingDecision>,

    /// Relaxation bound on the best objective in this subtree.
    #[serde(with = "bound_serde")]
    pub lower_bound: f64,

    /// Estimate of best integer solution reachable.
    #[serde(default = "neg_infinity", with = "bound_serde")]
    pub estimate: f64,
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

impl SearchNode {
    /// Create the root node.
    pub fn root(id: NodeId, lower_bound: f64) -> Self {
        Self {
            id,
            parent: None,
            depth: 0,
            branchings: Vec::new(),
            lower_bound,
            estimate: lower_bound,
        }
    }

    /// Create a child node by adding one branching decision.
    pub fn child(&self, id: NodeId, decision: BranchingDecision, lower_bound: f64) -> Self {
        let mut branchings = self.branchings.clone();
        branchings.push(decision);
        Self {
            id,
            parent: Some(self.id),
            depth: self.depth + 1,
            branchings,
            lower_bound,
            estimate: lower_bound,
        }
    }

    /// Builder-style estimate override.
    pub fn with_estimate(mut self, estimate: f64) -> Self {
        self.estimate = estimate;
        self
    }

    /// True for the root of the tree.
    pub fn is_root(&self) -> bool {
        self.depth == 0 && self.parent.is_none()
    }
}
