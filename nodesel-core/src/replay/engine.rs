//! Engine replaying a recorded tree under an arbitrary node selector.

use std::cmp::Ordering;
use std::time::Instant;

use super::tree::TreeIndex;
use super::{RecordedTree, ReplayStats, ReplayStatus, ReplayTrace, TraceStep};
use crate::error::{InvariantViolation, NodeselResult};
use crate::model::ProblemMetadata;
use crate::nodesel::{NodeSelector, Selection};
use crate::numerics::Tolerances;
use crate::oracle::Verdict;
use crate::search::{Frontier, NodeId, SearchEngine, SearchNode};
use crate::settings::{NativeOrdering, NodeselSettings};

/// Replays a recorded branch-and-bound tree.
///
/// Expanding a node opens exactly the children recorded for it, so the
/// attached selector only decides the order in which the tree is explored.
pub struct ReplayEngine {
    /// Instance metadata.
    problem: ProblemMetadata,

    /// Recorded nodes.
    nodes: Vec<SearchNode>,

    /// Parent/child index.
    index: TreeIndex,

    /// Open node positions, in opening order.
    open: Vec<usize>,

    /// Expansions in each node's subtree.
    visits: Vec<u64>,

    /// Total nodes expanded.
    nodes_expanded: u64,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: NodeselSettings,

    /// Bound comparison tolerances.
    tolerances: Tolerances,
}

impl ReplayEngine {
    /// Create an engine over a validated tree.
    pub fn new(tree: RecordedTree, settings: NodeselSettings) -> NodeselResult<Self> {
        let index = tree.index()?;
        let n = tree.nodes.len();
        Ok(Self {
            problem: tree.problem,
            nodes: tree.nodes,
            index,
            open: Vec::new(),
            visits: vec![0; n],
            nodes_expanded: 0,
            start_time: None,
            tolerances: Tolerances::new(settings.epsilon),
            settings,
        })
    }

    /// Instance metadata.
    pub fn problem(&self) -> &ProblemMetadata {
        &self.problem
    }

    /// Total nodes expanded in the current or last run.
    pub fn nodes_expanded(&self) -> u64 {
        self.nodes_expanded
    }

    /// Currently open nodes, in opening order.
    pub fn open_nodes(&self) -> impl Iterator<Item = &SearchNode> {
        self.open.iter().map(|&pos| &self.nodes[pos])
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Replay the whole tree under `selector`.
    ///
    /// The root is expanded first; afterwards every round hands the
    /// frontier to the selector and expands whatever it picks, or the
    /// engine's best open node under the selector's comparator when it
    /// defers.
    pub fn run(&mut self, selector: &mut dyn NodeSelector) -> NodeselResult<ReplayTrace> {
        self.reset();
        selector.init(&self.problem)?;
        self.start_time = Some(Instant::now());

        let mut steps = Vec::new();
        let mut status = ReplayStatus::Exhausted;
        let mut consistent_expanded = 0u64;
        let mut reference_reached_at = None;

        self.open.push(self.index.root);
        let mut next = Some((self.index.root, false));

        while let Some((pos, chosen_by_selector)) = next.take() {
            if self.nodes_expanded >= self.settings.max_nodes {
                status = ReplayStatus::NodeLimit;
                break;
            }

            self.expand(pos);

            let node = &self.nodes[pos];
            let verdict = selector.verdict(node);
            let consistent = verdict == Some(Verdict::Consistent);
            if consistent {
                consistent_expanded += 1;
            }
            steps.push(TraceStep {
                node: node.id,
                depth: node.depth,
                lower_bound: node.lower_bound,
                verdict,
                chosen_by_selector,
            });

            if consistent && self.index.children[pos].is_empty() && reference_reached_at.is_none()
            {
                reference_reached_at = Some(self.nodes_expanded);
                log::info!(
                    "Reference leaf {} of '{}' reached after {} nodes",
                    node.id,
                    self.problem.name,
                    self.nodes_expanded
                );
                if self.settings.stop_at_reference {
                    status = ReplayStatus::ReferenceReached;
                    break;
                }
            }

            self.log_progress();

            if !self.open.is_empty() {
                next = Some(self.choose(selector, pos)?);
            }
        }

        let nodes_open = self.open.len() as u64;
        let stats = ReplayStats {
            instance: self.problem.name.clone(),
            method: selector.name().to_string(),
            status,
            nodes_expanded: self.nodes_expanded,
            nodes_open,
            nodes_unreached: self.nodes.len() as u64 - self.nodes_expanded - nodes_open,
            consistent_expanded,
            reference_reached_at,
            elapsed_ms: self.elapsed_ms(),
            oracle: selector.diagnostics(),
        };

        log::info!(
            "Replay of '{}' with {}: {:?} after {} nodes ({} consistent)",
            stats.instance,
            stats.method,
            stats.status,
            stats.nodes_expanded,
            stats.consistent_expanded
        );

        Ok(ReplayTrace { stats, steps })
    }

    fn reset(&mut self) {
        self.open.clear();
        self.visits.iter_mut().for_each(|v| *v = 0);
        self.nodes_expanded = 0;
        self.start_time = None;
    }

    /// Close `pos`, open its recorded children and count the visit.
    fn expand(&mut self, pos: usize) {
        if let Some(i) = self.open.iter().position(|&p| p == pos) {
            self.open.remove(i);
        }
        self.open.extend_from_slice(&self.index.children[pos]);

        let mut cursor = Some(pos);
        while let Some(p) = cursor {
            self.visits[p] += 1;
            cursor = self.nodes[p]
                .parent
                .and_then(|id| self.index.by_id.get(&id).copied());
        }

        self.nodes_expanded += 1;
    }

    /// Split the open nodes around the focus node.
    fn frontier_groups(
        &self,
        focus: usize,
    ) -> (Vec<&SearchNode>, Vec<&SearchNode>, Vec<&SearchNode>) {
        let focus_id = self.nodes[focus].id;
        let focus_parent = self.nodes[focus].parent;

        let mut leaves = Vec::new();
        let mut children = Vec::new();
        let mut siblings = Vec::new();
        for &pos in &self.open {
            let node = &self.nodes[pos];
            if node.parent == Some(focus_id) {
                children.push(node);
            } else if focus_parent.is_some() && node.parent == focus_parent {
                siblings.push(node);
            } else {
                leaves.push(node);
            }
        }
        (leaves, children, siblings)
    }

    fn choose(&self, selector: &mut dyn NodeSelector, focus: usize) -> NodeselResult<(usize, bool)> {
        let (leaves, children, siblings) = self.frontier_groups(focus);
        let frontier = Frontier::new(&leaves, &children, &siblings);

        match selector.select(self, &frontier)? {
            Selection::Node(id) => {
                let pos = self
                    .open
                    .iter()
                    .copied()
                    .find(|&p| self.nodes[p].id == id)
                    .ok_or(InvariantViolation::NotOpen { node: id })?;
                Ok((pos, true))
            }
            Selection::Defer => Ok((self.best_open(&*selector)?, false)),
        }
    }

    /// Minimum open node under the selector's comparator; ties keep the
    /// earliest opened node.
    fn best_open(&self, selector: &dyn NodeSelector) -> NodeselResult<usize> {
        let mut best = self.open[0];
        for &pos in &self.open[1..] {
            if selector.compare(self, &self.nodes[pos], &self.nodes[best])? == Ordering::Less {
                best = pos;
            }
        }
        Ok(best)
    }

    fn restart_due(&self) -> bool {
        self.settings.restart_freq > 0 && self.nodes_expanded % self.settings.restart_freq == 0
    }

    fn bound_cmp(&self, a: f64, b: f64) -> Ordering {
        if self.tolerances.is_lt(a, b) {
            Ordering::Less
        } else if self.tolerances.is_gt(a, b) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    fn visits_of(&self, id: NodeId) -> u64 {
        self.index
            .by_id
            .get(&id)
            .map(|&pos| self.visits[pos])
            .unwrap_or(0)
    }

    /// Higher is better: small bounds plus an exploration bonus for
    /// children of busy parents that were rarely visited themselves.
    fn uct_score(&self, node: &SearchNode) -> f64 {
        let root_bound = self.nodes[self.index.root].lower_bound;
        let scale = if root_bound.is_finite() {
            root_bound.abs().max(1.0)
        } else {
            1.0
        };
        let parent_visits = node.parent.map(|p| self.visits_of(p)).unwrap_or(0) as f64;
        let own_visits = self.visits_of(node.id) as f64;

        -node.lower_bound / scale
            + self.settings.uct_weight * parent_visits.sqrt() / (own_visits + 1.0)
    }

    fn log_progress(&self) {
        if !self.settings.verbose || self.settings.log_freq == 0 {
            return;
        }

        if self.nodes_expanded % self.settings.log_freq != 0 {
            return;
        }

        log::info!(
            "Nodes: {} ({} open) | Instance: {} | Time: {:.1}s",
            self.nodes_expanded,
            self.open.len(),
            self.problem.name,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}

impl SearchEngine for ReplayEngine {
    fn node(&self, id: NodeId) -> Option<&SearchNode> {
        self.index.by_id.get(&id).map(|&pos| &self.nodes[pos])
    }

    fn tolerances(&self) -> Tolerances {
        self.tolerances
    }

    fn native_select(&self, ordering: NativeOrdering) -> Option<NodeId> {
        let ordering = match ordering {
            NativeOrdering::RestartDepthFirst if self.restart_due() => NativeOrdering::BestFirst,
            other => other,
        };
        self.open_nodes()
            .min_by(|a, b| self.native_compare(ordering, a, b))
            .map(|n| n.id)
    }

    fn native_compare(
        &self,
        ordering: NativeOrdering,
        a: &SearchNode,
        b: &SearchNode,
    ) -> Ordering {
        match ordering {
            NativeOrdering::BestFirst => self
                .bound_cmp(a.lower_bound, b.lower_bound)
                .then_with(|| self.bound_cmp(a.estimate, b.estimate)),
            NativeOrdering::DepthFirst | NativeOrdering::RestartDepthFirst => b
                .depth
                .cmp(&a.depth)
                .then_with(|| self.bound_cmp(a.lower_bound, b.lower_bound)),
            NativeOrdering::BreadthFirst => a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)),
            NativeOrdering::BestEstimate => self
                .bound_cmp(a.estimate, b.estimate)
                .then_with(|| self.bound_cmp(a.lower_bound, b.lower_bound)),
            NativeOrdering::HybridEstimate => {
                let w = self.settings.hybrid_bound_weight;
                let score = |n: &SearchNode| w * n.lower_bound + (1.0 - w) * n.estimate;
                self.bound_cmp(score(a), score(b))
                    .then_with(|| self.bound_cmp(a.lower_bound, b.lower_bound))
            }
            NativeOrdering::Uct => self
                .uct_score(b)
                .partial_cmp(&self.uct_score(a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.bound_cmp(a.lower_bound, b.lower_bound)),
        }
    }
}
