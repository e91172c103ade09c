//! The engine side of the node selection protocol.

use std::cmp::Ordering;

use super::{NodeId, SearchNode};
use crate::numerics::Tolerances;
use crate::settings::NativeOrdering;

/// What a branch-and-bound engine exposes to node selectors.
///
/// Selectors never own engine nodes; parent links are resolved through
/// [`SearchEngine::node`].
pub trait SearchEngine {
    /// Look up a node (open or already processed) by id.
    fn node(&self, id: NodeId) -> Option<&SearchNode>;

    /// Tolerances used for bound comparisons.
    fn tolerances(&self) -> Tolerances;

    /// Tolerant less-than on bound values.
    fn is_lt(&self, a: f64, b: f64) -> bool {
        self.tolerances().is_lt(a, b)
    }

    /// Tolerant greater-than on bound values.
    fn is_gt(&self, a: f64, b: f64) -> bool {
        self.tolerances().is_gt(a, b)
    }

    /// Node the given built-in ordering would expand next.
    fn native_select(&self, ordering: NativeOrdering) -> Option<NodeId>;

    /// Built-in ordering of two open nodes (`Less` = `a` first).
    fn native_compare(&self, ordering: NativeOrdering, a: &SearchNode, b: &SearchNode)
        -> Ordering;
}
