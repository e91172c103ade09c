//! Oracle node selection: steer the search toward the reference solution.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{ClassifierStats, NodeClassifier, Verdict};
use crate::error::{InvariantViolation, NodeselError, NodeselResult};
use crate::model::{ProblemMetadata, ReferenceSolution, ReferenceSource};
use crate::nodesel::{NodeSelector, Selection};
use crate::search::{Frontier, NodeId, SearchEngine, SearchNode};

/// Last consistent child seen in a selection round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTarget {
    /// Node id of the child.
    pub node: NodeId,

    /// Its position in the round's children.
    pub child_index: usize,
}

/// Per-instance diagnostics of the oracle policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDiagnostics {
    /// Classifier counters.
    pub classification: ClassifierStats,

    /// Number of binary plus integer variables of the instance.
    pub max_depth: usize,

    /// Selection rounds.
    pub rounds: u64,

    /// Rounds in which a consistent parent got no consistent child.
    pub ambiguous_none: u64,

    /// Rounds in which a parent got more than one consistent child.
    pub ambiguous_multiple: u64,
}

/// Node selector driven by a known optimal solution.
///
/// Children are classified as they appear; the comparator puts consistent
/// nodes first, then deeper nodes, then smaller lower bounds. Selection
/// itself defers to the engine's best node, which follows the comparator.
pub struct OraclePolicy {
    source: ReferenceSource,
    reference: Option<ReferenceSolution>,
    classifier: NodeClassifier,
    target: Option<SelectionTarget>,
    diagnostics: PolicyDiagnostics,
    steer_comparisons: bool,
}

impl OraclePolicy {
    /// Oracle steering both selection and comparison.
    pub fn new(source: ReferenceSource) -> Self {
        Self {
            source,
            reference: None,
            classifier: NodeClassifier::new(),
            target: None,
            diagnostics: PolicyDiagnostics::default(),
            steer_comparisons: true,
        }
    }

    /// Oracle that classifies but leaves every comparison neutral.
    pub fn select_only(source: ReferenceSource) -> Self {
        Self {
            steer_comparisons: false,
            ..Self::new(source)
        }
    }

    /// Whether the comparator is steered by verdicts.
    pub fn steers_comparisons(&self) -> bool {
        self.steer_comparisons
    }

    /// Selection target of the latest round.
    pub fn target(&self) -> Option<SelectionTarget> {
        self.target
    }

    /// Diagnostics since the last search start.
    pub fn diagnostics(&self) -> PolicyDiagnostics {
        PolicyDiagnostics {
            classification: self.classifier.stats(),
            ..self.diagnostics
        }
    }

    /// The classifier and its memo.
    pub fn classifier(&self) -> &NodeClassifier {
        &self.classifier
    }

    /// Reference solution loaded for the current instance.
    pub fn reference(&self) -> Option<&ReferenceSolution> {
        self.reference.as_ref()
    }

    fn memoized(&self, node: &SearchNode) -> NodeselResult<Verdict> {
        self.classifier
            .verdict(node.id)
            .ok_or_else(|| InvariantViolation::Unclassified { node: node.id }.into())
    }

    /// Verdict-aware total order, `Less` meaning `a` is expanded first.
    fn order(
        &self,
        engine: &dyn SearchEngine,
        a: &SearchNode,
        b: &SearchNode,
    ) -> NodeselResult<Ordering> {
        let va = self.memoized(a)?;
        let vb = self.memoized(b)?;

        match (va, vb) {
            (Verdict::Consistent, Verdict::Inconsistent) => return Ok(Ordering::Less),
            (Verdict::Inconsistent, Verdict::Consistent) => return Ok(Ordering::Greater),
            _ => {}
        }

        // Deeper first
        match b.depth.cmp(&a.depth) {
            Ordering::Equal => {}
            other => return Ok(other),
        }

        if engine.is_lt(a.lower_bound, b.lower_bound) {
            return Ok(Ordering::Less);
        }
        if engine.is_gt(a.lower_bound, b.lower_bound) {
            return Ok(Ordering::Greater);
        }

        // Within tolerance: fall back to the raw values.
        Ok(a
            .lower_bound
            .partial_cmp(&b.lower_bound)
            .unwrap_or(Ordering::Equal))
    }

    fn check_ambiguity(&mut self, children: &[&SearchNode], fresh: &[(NodeId, Verdict)]) {
        // Group the freshly classified children by parent.
        let mut parents: Vec<(Option<NodeId>, usize)> = Vec::new();
        for (id, verdict) in fresh {
            let Some(child) = children.iter().find(|c| c.id == *id) else {
                continue;
            };
            let consistent = usize::from(verdict.is_consistent());
            match parents.iter_mut().find(|(p, _)| *p == child.parent) {
                Some((_, count)) => *count += consistent,
                None => parents.push((child.parent, consistent)),
            }
        }

        for (parent, consistent) in parents {
            let Some(parent) = parent else { continue };
            let parent_consistent = match self.classifier.verdict(parent) {
                Some(v) => v.is_consistent(),
                // Unmemoized parent of a classified child: the root.
                None => true,
            };
            if !parent_consistent {
                continue;
            }

            if consistent == 0 {
                self.diagnostics.ambiguous_none += 1;
                log::warn!(
                    "Ambiguous classification: no child of consistent node {} is consistent",
                    parent
                );
            } else if consistent > 1 {
                self.diagnostics.ambiguous_multiple += 1;
                log::warn!(
                    "Ambiguous classification: {} children of node {} are consistent",
                    consistent,
                    parent
                );
            }
        }
    }
}

impl NodeSelector for OraclePolicy {
    fn name(&self) -> &str {
        if self.steer_comparisons {
            "oracle"
        } else {
            "oracle_nodesel"
        }
    }

    fn init(&mut self, problem: &ProblemMetadata) -> NodeselResult<()> {
        self.classifier.clear();
        self.target = None;
        self.reference = None;
        self.diagnostics = PolicyDiagnostics {
            max_depth: problem.num_binary() + problem.num_integer(),
            ..PolicyDiagnostics::default()
        };

        let reference = self.source.load(problem).map_err(|e| match e {
            NodeselError::Configuration(msg) => NodeselError::Configuration(format!(
                "Reference solution for '{}' unavailable: {}",
                problem.name, msg
            )),
            other => other,
        })?;

        log::info!(
            "Oracle initialized for '{}': {} variables, max depth {}",
            problem.name,
            reference.len(),
            self.diagnostics.max_depth
        );

        self.reference = Some(reference);
        Ok(())
    }

    fn select(
        &mut self,
        _engine: &dyn SearchEngine,
        frontier: &Frontier<'_>,
    ) -> NodeselResult<Selection> {
        let reference = self.reference.as_ref().ok_or_else(|| {
            NodeselError::Configuration("Oracle selection before initialization".to_string())
        })?;

        self.diagnostics.rounds += 1;
        self.target = None;

        let mut fresh = Vec::new();
        for (idx, child) in frontier.children.iter().enumerate() {
            let verdict = match self.classifier.verdict(child.id) {
                Some(v) => v,
                None => {
                    let v = self.classifier.classify(child, reference)?;
                    fresh.push((child.id, v));
                    v
                }
            };

            if verdict.is_consistent() {
                self.target = Some(SelectionTarget {
                    node: child.id,
                    child_index: idx,
                });
            }
        }

        if !fresh.is_empty() {
            self.check_ambiguity(frontier.children, &fresh);
        }

        // TODO: expand `target` directly once subtree pruning of
        // inconsistent siblings is in place.
        Ok(Selection::Defer)
    }

    fn compare(
        &self,
        engine: &dyn SearchEngine,
        a: &SearchNode,
        b: &SearchNode,
    ) -> NodeselResult<Ordering> {
        if !self.steer_comparisons {
            return Ok(Ordering::Equal);
        }
        self.order(engine, a, b)
    }

    fn verdict(&self, node: &SearchNode) -> Option<Verdict> {
        match self.classifier.verdict(node.id) {
            Some(v) => Some(v),
            // The root is never handed over as a child, so it has no memo entry.
            None if node.is_root() && self.reference.is_some() => Some(Verdict::Consistent),
            None => None,
        }
    }

    fn diagnostics(&self) -> Option<PolicyDiagnostics> {
        Some(OraclePolicy::diagnostics(self))
    }
}
