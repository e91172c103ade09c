//! Consistency of search nodes with a reference solution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{InvariantViolation, NodeselResult};
use crate::model::ReferenceSolution;
use crate::search::{NodeId, SearchNode};

/// Whether the reference solution is still reachable from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Every accumulated branching decision is satisfied by the reference.
    Consistent,

    /// At least one branching decision cuts the reference off.
    Inconsistent,
}

impl Verdict {
    /// True for [`Verdict::Consistent`].
    pub fn is_consistent(&self) -> bool {
        matches!(self, Verdict::Consistent)
    }
}

/// Counters gathered while classifying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierStats {
    /// Nodes classified.
    pub classified: u64,

    /// Nodes found consistent.
    pub consistent: u64,

    /// Nodes found inconsistent.
    pub inconsistent: u64,

    /// Branching decisions the reference violated, over all nodes.
    pub violated_decisions: u64,

    /// Consistent nodes whose parent was inconsistent.
    pub parent_disagreements: u64,
}

/// Memoizing classifier, one verdict per node id.
///
/// Memory grows with the tree of the current instance; [`clear`] releases it.
///
/// [`clear`]: NodeClassifier::clear
#[derive(Debug, Default)]
pub struct NodeClassifier {
    memo: HashMap<NodeId, Verdict>,
    stats: ClassifierStats,
}

impl NodeClassifier {
    /// Create an empty classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every verdict and counter.
    pub fn clear(&mut self) {
        self.memo.clear();
        self.stats = ClassifierStats::default();
    }

    /// Memoized verdict of a node.
    pub fn verdict(&self, id: NodeId) -> Option<Verdict> {
        self.memo.get(&id).copied()
    }

    /// Check if a node has a verdict.
    pub fn is_classified(&self, id: NodeId) -> bool {
        self.memo.contains_key(&id)
    }

    /// Number of memoized verdicts.
    pub fn len(&self) -> usize {
        self.memo.len()
    }

    /// Check if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Counters since the last [`clear`](NodeClassifier::clear).
    pub fn stats(&self) -> ClassifierStats {
        self.stats
    }

    /// Classify a node that has not been seen yet and memoize the verdict.
    ///
    /// The root is consistent by definition. Any other node needs its
    /// parent classified first, except children of the root. Every
    /// decision is checked so that the violation count is complete.
    pub fn classify(
        &mut self,
        node: &SearchNode,
        reference: &ReferenceSolution,
    ) -> NodeselResult<Verdict> {
        if self.memo.contains_key(&node.id) {
            return Err(InvariantViolation::AlreadyClassified { node: node.id }.into());
        }

        let parent_verdict = match node.parent {
            None if node.depth == 0 => None,
            None => {
                return Err(InvariantViolation::OrphanNode {
                    node: node.id,
                    depth: node.depth,
                }
                .into())
            }
            Some(parent) => match self.memo.get(&parent) {
                Some(v) => Some(*v),
                // Root is never handed over as a child.
                None if node.depth == 1 => Some(Verdict::Consistent),
                None => {
                    return Err(InvariantViolation::ParentUnclassified {
                        node: node.id,
                        parent,
                    }
                    .into())
                }
            },
        };

        let violated = if parent_verdict.is_none() {
            0
        } else {
            node.branchings
                .iter()
                .filter(|d| d.is_violated_by(reference.value(d.var)))
                .count()
        };

        let verdict = if violated == 0 {
            Verdict::Consistent
        } else {
            Verdict::Inconsistent
        };

        if verdict.is_consistent() && parent_verdict == Some(Verdict::Inconsistent) {
            self.stats.parent_disagreements += 1;
            log::warn!(
                "Node {} is consistent but its parent {:?} is not; branchings may not accumulate",
                node.id,
                node.parent
            );
        }

        log::debug!(
            "Classified node {} (depth {}): {:?}, {} of {} decisions violated",
            node.id,
            node.depth,
            verdict,
            violated,
            node.branchings.len()
        );

        self.stats.classified += 1;
        self.stats.violated_decisions += violated as u64;
        match verdict {
            Verdict::Consistent => self.stats.consistent += 1,
            Verdict::Inconsistent => self.stats.inconsistent += 1,
        }
        self.memo.insert(node.id, verdict);

        Ok(verdict)
    }
}
