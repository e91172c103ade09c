//! Open-node snapshot handed to selectors each round.

use super::{NodeId, SearchNode};

/// The pending nodes of the search tree, split the way the engine sees them.
///
/// The three groups are disjoint and borrow the engine's nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frontier<'a> {
    /// Open nodes that are neither children nor siblings of the focus node.
    pub leaves: &'a [&'a SearchNode],

    /// Children just created by expanding the focus node.
    pub children: &'a [&'a SearchNode],

    /// Open nodes sharing the focus node's parent.
    pub siblings: &'a [&'a SearchNode],
}

impl<'a> Frontier<'a> {
    /// Create a frontier from its three groups.
    pub fn new(
        leaves: &'a [&'a SearchNode],
        children: &'a [&'a SearchNode],
        siblings: &'a [&'a SearchNode],
    ) -> Self {
        Self {
            leaves,
            children,
            siblings,
        }
    }

    /// Total number of open nodes.
    pub fn len(&self) -> usize {
        self.leaves.len() + self.children.len() + self.siblings.len()
    }

    /// Check if no node is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every open node: children, then siblings, then leaves.
    pub fn iter(&self) -> impl Iterator<Item = &'a SearchNode> {
        self.children
            .iter()
            .chain(self.siblings.iter())
            .chain(self.leaves.iter())
            .copied()
    }

    /// Find an open node by id.
    pub fn find(&self, id: NodeId) -> Option<&'a SearchNode> {
        self.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{BranchingDecision, VarId};

    #[test]
    fn test_iteration_order() {
        let root = SearchNode::root(NodeId(1), 0.0);
        let a = root.child(NodeId(2), BranchingDecision::upper(VarId(0), 0.0), 0.0);
        let b = root.child(NodeId(3), BranchingDecision::lower(VarId(0), 1.0), 0.0);
        let c = a.child(NodeId(4), BranchingDecision::upper(VarId(1), 0.0), 0.0);

        let children = [&c];
        let siblings = [&b];
        let frontier = Frontier::new(&[], &children, &siblings);

        assert_eq!(frontier.len(), 2);
        let ids: Vec<_> = frontier.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(4), NodeId(3)]);
        assert!(frontier.find(NodeId(3)).is_some());
        assert!(frontier.find(NodeId(2)).is_none());
    }

    #[test]
    fn test_empty() {
        assert!(Frontier::default().is_empty());
    }
}
