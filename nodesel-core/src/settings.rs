//! Configuration settings for node selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NodeselError;
use crate::numerics::DEFAULT_EPSILON;

/// Built-in node orderings provided by the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeOrdering {
    /// Select by estimated objective value.
    BestEstimate,

    /// Always select node with best (lowest) lower bound.
    BestFirst,

    /// Shallowest node first.
    BreadthFirst,

    /// Deepest node first.
    DepthFirst,

    /// Weighted mix of lower bound and estimate.
    HybridEstimate,

    /// Depth-first, periodically restarting from the best-bound node.
    RestartDepthFirst,

    /// Upper-confidence-bound tree search over the open nodes.
    Uct,
}

/// Which node selector to attach to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// Oracle classification steering both selection and comparison.
    Oracle,

    /// Oracle classification only; comparisons are left neutral.
    OracleSelectOnly,

    /// Delegate to one of the engine's orderings.
    Native(NativeOrdering),
}

impl SelectorKind {
    /// Every selector the driver can run.
    pub const ALL: [SelectorKind; 9] = [
        SelectorKind::Oracle,
        SelectorKind::OracleSelectOnly,
        SelectorKind::Native(NativeOrdering::BestEstimate),
        SelectorKind::Native(NativeOrdering::BestFirst),
        SelectorKind::Native(NativeOrdering::BreadthFirst),
        SelectorKind::Native(NativeOrdering::DepthFirst),
        SelectorKind::Native(NativeOrdering::HybridEstimate),
        SelectorKind::Native(NativeOrdering::RestartDepthFirst),
        SelectorKind::Native(NativeOrdering::Uct),
    ];

    /// Method name used on the command line and in output file names.
    pub fn method_name(&self) -> &'static str {
        match self {
            SelectorKind::Oracle => "oracle",
            SelectorKind::OracleSelectOnly => "oracle_nodesel",
            SelectorKind::Native(NativeOrdering::BestEstimate) => "estimate",
            SelectorKind::Native(NativeOrdering::BestFirst) => "bfs",
            SelectorKind::Native(NativeOrdering::BreadthFirst) => "breadth",
            SelectorKind::Native(NativeOrdering::DepthFirst) => "dfs",
            SelectorKind::Native(NativeOrdering::HybridEstimate) => "hybrid",
            SelectorKind::Native(NativeOrdering::RestartDepthFirst) => "restartdfs",
            SelectorKind::Native(NativeOrdering::Uct) => "uct",
        }
    }

    /// Whether this selector needs a reference solution.
    pub fn needs_reference(&self) -> bool {
        matches!(self, SelectorKind::Oracle | SelectorKind::OracleSelectOnly)
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

impl FromStr for SelectorKind {
    type Err = NodeselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectorKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.method_name() == s)
            .ok_or_else(|| NodeselError::Configuration(format!("Unknown method: {}", s)))
    }
}

/// Node selection and replay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeselSettings {
    // === Selector ===
    /// Selector attached to the engine.
    pub method: SelectorKind,

    /// Epsilon for tolerant bound comparisons.
    pub epsilon: f64,

    // === Replay ===
    /// Maximum number of nodes to expand.
    pub max_nodes: u64,

    /// Stop once a consistent node without children has been expanded.
    pub stop_at_reference: bool,

    /// Restart-DFS picks the best-bound node every N expansions.
    pub restart_freq: u64,

    /// Weight of the lower bound in the hybrid estimate ordering.
    pub hybrid_bound_weight: f64,

    /// Exploration weight of the UCT ordering.
    pub uct_weight: f64,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for NodeselSettings {
    fn default() -> Self {
        Self {
            method: SelectorKind::Oracle,
            epsilon: DEFAULT_EPSILON,

            max_nodes: 1_000_000,
            stop_at_reference: false,
            restart_freq: 100,
            hybrid_bound_weight: 0.1,
            uct_weight: 0.1,

            verbose: false,
            log_freq: 100,
        }
    }
}

impl NodeselSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Set the selector.
    pub fn with_method(mut self, method: SelectorKind) -> Self {
        self.method = method;
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set the comparison epsilon.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Stop the replay at the reference leaf.
    pub fn with_stop_at_reference(mut self, stop: bool) -> Self {
        self.stop_at_reference = stop;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names_round_trip() {
        for kind in SelectorKind::ALL {
            assert_eq!(kind.method_name().parse::<SelectorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_method() {
        let err = "random".parse::<SelectorKind>().unwrap_err();
        assert!(matches!(err, NodeselError::Configuration(_)));
    }

    #[test]
    fn test_reference_requirement() {
        assert!(SelectorKind::Oracle.needs_reference());
        assert!(SelectorKind::OracleSelectOnly.needs_reference());
        assert!(!SelectorKind::Native(NativeOrdering::DepthFirst).needs_reference());
    }

    #[test]
    fn test_builders() {
        let s = NodeselSettings::default()
            .with_method(SelectorKind::Native(NativeOrdering::Uct))
            .with_max_nodes(10)
            .with_stop_at_reference(true);
        assert_eq!(s.method.to_string(), "uct");
        assert_eq!(s.max_nodes, 10);
        assert!(s.stop_at_reference);
        assert!(NodeselSettings::verbose().verbose);
    }
}
