//! Node selector plugins attached to the search engine.

use std::cmp::Ordering;

use crate::error::{NodeselError, NodeselResult};
use crate::model::{ProblemMetadata, ReferenceSource};
use crate::oracle::{OraclePolicy, PolicyDiagnostics, Verdict};
use crate::search::{Frontier, NodeId, SearchEngine, SearchNode};
use crate::settings::{NativeOrdering, SelectorKind};

/// Outcome of a selection round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Expand this node next.
    Node(NodeId),

    /// Let the engine pick its best node (ordered by [`NodeSelector::compare`]).
    Defer,
}

/// A node selection plugin.
///
/// The engine calls [`init`](NodeSelector::init) once per instance, then
/// [`select`](NodeSelector::select) after every expansion and
/// [`compare`](NodeSelector::compare) whenever it orders open nodes.
pub trait NodeSelector {
    /// Method name.
    fn name(&self) -> &str;

    /// Reset per-instance state before the search starts.
    fn init(&mut self, problem: &ProblemMetadata) -> NodeselResult<()>;

    /// Choose the next node to expand.
    fn select(
        &mut self,
        engine: &dyn SearchEngine,
        frontier: &Frontier<'_>,
    ) -> NodeselResult<Selection>;

    /// Total order over open nodes, `Less` meaning `a` is preferred.
    fn compare(
        &self,
        engine: &dyn SearchEngine,
        a: &SearchNode,
        b: &SearchNode,
    ) -> NodeselResult<Ordering>;

    /// Classification of a node, for selectors that keep one.
    fn verdict(&self, _node: &SearchNode) -> Option<Verdict> {
        None
    }

    /// Oracle diagnostics, for selectors that keep them.
    fn diagnostics(&self) -> Option<PolicyDiagnostics> {
        None
    }
}

/// Forwards selection and comparison to one of the engine's orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeDelegate {
    ordering: NativeOrdering,
}

impl NativeDelegate {
    /// Delegate to `ordering`.
    pub fn new(ordering: NativeOrdering) -> Self {
        Self { ordering }
    }

    /// The wrapped ordering.
    pub fn ordering(&self) -> NativeOrdering {
        self.ordering
    }
}

impl NodeSelector for NativeDelegate {
    fn name(&self) -> &str {
        SelectorKind::Native(self.ordering).method_name()
    }

    fn init(&mut self, _problem: &ProblemMetadata) -> NodeselResult<()> {
        Ok(())
    }

    fn select(
        &mut self,
        engine: &dyn SearchEngine,
        _frontier: &Frontier<'_>,
    ) -> NodeselResult<Selection> {
        Ok(engine
            .native_select(self.ordering)
            .map_or(Selection::Defer, Selection::Node))
    }

    fn compare(
        &self,
        engine: &dyn SearchEngine,
        a: &SearchNode,
        b: &SearchNode,
    ) -> NodeselResult<Ordering> {
        Ok(engine.native_compare(self.ordering, a, b))
    }
}

/// Build the selector for `kind`.
///
/// Oracle selectors need a reference source.
pub fn build_selector(
    kind: SelectorKind,
    reference: Option<ReferenceSource>,
) -> NodeselResult<Box<dyn NodeSelector>> {
    let need_reference = || {
        reference.clone().ok_or_else(|| {
            NodeselError::Configuration(format!("Method '{}' needs a reference solution", kind))
        })
    };

    Ok(match kind {
        SelectorKind::Oracle => Box::new(OraclePolicy::new(need_reference()?)),
        SelectorKind::OracleSelectOnly => Box::new(OraclePolicy::select_only(need_reference()?)),
        SelectorKind::Native(ordering) => Box::new(NativeDelegate::new(ordering)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SolutionFile;
    use crate::numerics::Tolerances;

    /// Engine stub answering every native request with a fixed choice.
    struct Fixed {
        pick: Option<NodeId>,
    }

    impl SearchEngine for Fixed {
        fn node(&self, _id: NodeId) -> Option<&SearchNode> {
            None
        }

        fn tolerances(&self) -> Tolerances {
            Tolerances::default()
        }

        fn native_select(&self, ordering: NativeOrdering) -> Option<NodeId> {
            match ordering {
                NativeOrdering::DepthFirst => self.pick,
                _ => None,
            }
        }

        fn native_compare(
            &self,
            ordering: NativeOrdering,
            a: &SearchNode,
            b: &SearchNode,
        ) -> Ordering {
            match ordering {
                NativeOrdering::BreadthFirst => a.depth.cmp(&b.depth),
                _ => b.depth.cmp(&a.depth),
            }
        }
    }

    #[test]
    fn test_native_delegate_forwards() {
        let engine = Fixed {
            pick: Some(NodeId(7)),
        };
        let mut dfs = NativeDelegate::new(NativeOrdering::DepthFirst);
        assert_eq!(dfs.name(), "dfs");
        assert_eq!(
            dfs.select(&engine, &Frontier::default()).unwrap(),
            Selection::Node(NodeId(7))
        );

        let mut bfs = NativeDelegate::new(NativeOrdering::BestFirst);
        assert_eq!(
            bfs.select(&engine, &Frontier::default()).unwrap(),
            Selection::Defer
        );

        let shallow = SearchNode::root(NodeId(1), 0.0);
        let mut deep = shallow.clone();
        deep.id = NodeId(2);
        deep.depth = 3;
        let breadth = NativeDelegate::new(NativeOrdering::BreadthFirst);
        assert_eq!(
            breadth.compare(&engine, &shallow, &deep).unwrap(),
            Ordering::Less
        );
        assert_eq!(dfs.compare(&engine, &shallow, &deep).unwrap(), Ordering::Greater);
        assert!(dfs.verdict(&shallow).is_none());
    }

    #[test]
    fn test_build_selector_names() {
        let reference = ReferenceSource::Preloaded(SolutionFile::default());
        for kind in SelectorKind::ALL {
            let selector = build_selector(kind, Some(reference.clone())).unwrap();
            assert_eq!(selector.name(), kind.method_name());
        }
    }

    #[test]
    fn test_oracle_requires_reference() {
        let err = build_selector(SelectorKind::Oracle, None).err().unwrap();
        assert!(matches!(err, NodeselError::Configuration(_)));
        assert!(build_selector(SelectorKind::OracleSelectOnly, None).is_err());
        assert!(build_selector(SelectorKind::Native(NativeOrdering::Uct), None).is_ok());
    }
}
