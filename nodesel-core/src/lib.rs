//! Oracle-guided node selection for branch-and-bound search.
//!
//! Given a known optimal (reference) solution, the oracle selector marks
//! every node whose accumulated branching decisions still admit that
//! solution as *consistent* and orders the open nodes so that consistent
//! nodes are always expanded first. Replaying a search under the oracle
//! yields the minimal path to the optimum, which is used as a training and
//! benchmarking target for learned node selection.
//!
//! The crate provides:
//!
//! - [`oracle`]: the memoizing [`NodeClassifier`] and the [`OraclePolicy`]
//! - [`nodesel`]: the [`NodeSelector`] plugin interface, delegates to the
//!   engine's built-in orderings and [`build_selector`]
//! - [`model`]: problem metadata and reference solution files
//! - [`replay`]: an engine replaying recorded trees under any selector

#![warn(missing_docs)]

pub mod error;
pub mod model;
pub mod nodesel;
pub mod numerics;
pub mod oracle;
pub mod replay;
pub mod search;
pub mod settings;

pub use error::{InvariantViolation, NodeselError, NodeselResult};
pub use model::{ProblemMetadata, ReferenceSolution, ReferenceSource, SolutionFile};
pub use nodesel::{build_selector, NativeDelegate, NodeSelector, Selection};
pub use numerics::Tolerances;
pub use oracle::{NodeClassifier, OraclePolicy, PolicyDiagnostics, Verdict};
pub use replay::{RecordedTree, ReplayEngine, ReplayStats, ReplayStatus, ReplayTrace};
pub use search::{BranchingDecision, Frontier, NodeId, SearchEngine, SearchNode, VarId};
pub use settings::{NativeOrdering, NodeselSettings, SelectorKind};

/// Replay one recorded tree under the selector named in `settings`.
pub fn replay_tree(
    tree: RecordedTree,
    reference: Option<ReferenceSource>,
    settings: &NodeselSettings,
) -> NodeselResult<ReplayTrace> {
    let mut selector = build_selector(settings.method, reference)?;
    let mut engine = ReplayEngine::new(tree, settings.clone())?;
    engine.run(selector.as_mut())
}
