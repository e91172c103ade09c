//! Integration tests: oracle replays of complete binary branching trees.

use std::io::Write;

use nodesel_core::model::{VarType, VariableInfo};
use nodesel_core::replay::ReplayStatus;
use nodesel_core::{
    replay_tree, BranchingDecision, NativeOrdering, NodeId, NodeselError, NodeselSettings,
    ProblemMetadata, RecordedTree, ReferenceSource, SearchNode, SelectorKind, VarId, Verdict,
};
use tempfile::NamedTempFile;

/// Complete binary tree branching on x0, x1, ... in depth order.
///
/// Node ids are assigned breadth-first from 1. Lower bounds come from a
/// small LCG and never decrease along a path.
fn complete_tree(num_vars: usize, seed: u64) -> RecordedTree {
    let mut rng_state = seed;
    let mut rand = || -> f64 {
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((rng_state >> 33) as f64) / (u32::MAX as f64)
    };

    let variables = (0..num_vars)
        .map(|i| VariableInfo::new(format!("x{}", i), VarType::Binary))
        .collect();
    let problem = ProblemMetadata::new(format!("complete_{}", num_vars), variables);

    let mut nodes = vec![SearchNode::root(NodeId(1), 0.0)];
    let mut next_id = 2;
    let mut level = vec![0usize];
    for var in 0..num_vars {
        let mut next_level = Vec::new();
        for &pos in &level {
            let parent = nodes[pos].clone();
            for decision in [
                BranchingDecision::upper(VarId(var), 0.0),
                BranchingDecision::lower(VarId(var), 1.0),
            ] {
                let bound = parent.lower_bound + rand() * 10.0;
                let child = parent
                    .child(NodeId(next_id), decision, bound)
                    .with_estimate(bound + rand());
                next_id += 1;
                next_level.push(nodes.len());
                nodes.push(child);
            }
        }
        level = next_level;
    }

    RecordedTree::new(problem, nodes)
}

/// Leaf whose path assigns exactly `values`.
fn reference_leaf(tree: &RecordedTree, values: &[f64]) -> NodeId {
    tree.nodes
        .iter()
        .find(|n| {
            n.depth == values.len()
                && n.branchings
                    .iter()
                    .all(|d| !d.is_violated_by(values[d.var.0]))
        })
        .map(|n| n.id)
        .expect("reference leaf exists")
}

fn solution_file(values: &[f64]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "solution status: optimal solution found").unwrap();
    writeln!(file, "objective value: 42").unwrap();
    for (i, v) in values.iter().enumerate() {
        if *v != 0.0 {
            writeln!(file, "x{}  {} \t(obj:1)", i, v).unwrap();
        }
    }
    file.flush().expect("Failed to flush temp file");
    file
}

#[test]
fn test_oracle_reaches_reference_with_minimal_expansions() {
    let values = [1.0, 0.0, 1.0, 1.0, 0.0];
    let tree = complete_tree(values.len(), 7);
    let leaf = reference_leaf(&tree, &values);
    let sol = solution_file(&values);

    let settings = NodeselSettings::default().with_method(SelectorKind::Oracle);
    let trace = replay_tree(
        tree,
        Some(ReferenceSource::File(sol.path().to_path_buf())),
        &settings,
    )
    .unwrap();

    // Root plus one consistent node per level.
    assert_eq!(trace.stats.reference_reached_at, Some(values.len() as u64 + 1));
    assert_eq!(trace.order()[values.len()], leaf);
    assert_eq!(trace.consistent_path().len(), values.len() + 1);
    assert_eq!(trace.consistent_path()[0], NodeId(1));
    assert_eq!(trace.stats.nodes_expanded, (1 << (values.len() + 1)) - 1);

    let diag = trace.stats.oracle.unwrap();
    assert_eq!(diag.ambiguous_none, 0);
    assert_eq!(diag.ambiguous_multiple, 0);
    assert_eq!(diag.max_depth, values.len());
}

#[test]
fn test_consistent_steps_form_a_single_path() {
    let values = [0.0, 1.0, 1.0, 0.0];
    let tree = complete_tree(values.len(), 11);
    let by_id: std::collections::HashMap<_, _> =
        tree.nodes.iter().map(|n| (n.id, n.clone())).collect();
    let sol = solution_file(&values);

    let settings = NodeselSettings::default();
    let trace = replay_tree(
        tree,
        Some(ReferenceSource::File(sol.path().to_path_buf())),
        &settings,
    )
    .unwrap();

    let path = trace.consistent_path();
    for pair in path.windows(2) {
        assert_eq!(by_id[&pair[1]].parent, Some(pair[0]));
    }
    assert!(trace
        .steps
        .iter()
        .filter(|s| s.verdict == Some(Verdict::Inconsistent))
        .all(|s| !path.contains(&s.node)));
}

#[test]
fn test_oracle_never_slower_than_native_orderings() {
    let values = [1.0, 1.0, 0.0, 1.0];
    let sol = solution_file(&values);

    let oracle = replay_tree(
        complete_tree(values.len(), 3),
        Some(ReferenceSource::File(sol.path().to_path_buf())),
        &NodeselSettings::default(),
    )
    .unwrap();
    let oracle_at = oracle.stats.reference_reached_at.unwrap();

    for ordering in [
        NativeOrdering::BestFirst,
        NativeOrdering::DepthFirst,
        NativeOrdering::BreadthFirst,
        NativeOrdering::BestEstimate,
        NativeOrdering::HybridEstimate,
        NativeOrdering::RestartDepthFirst,
        NativeOrdering::Uct,
    ] {
        let tree = complete_tree(values.len(), 3);
        let leaf = reference_leaf(&tree, &values);
        let settings = NodeselSettings::default().with_method(SelectorKind::Native(ordering));
        let trace = replay_tree(tree, None, &settings).unwrap();

        assert_eq!(trace.stats.status, ReplayStatus::Exhausted);
        let native_at = trace.order().iter().position(|&id| id == leaf).unwrap() as u64 + 1;
        assert!(
            oracle_at <= native_at,
            "{:?} reached the reference after {} nodes, oracle after {}",
            ordering,
            native_at,
            oracle_at
        );
    }
}

#[test]
fn test_missing_solution_aborts_only_that_instance() {
    let settings = NodeselSettings::default().with_method(SelectorKind::Oracle);
    let err = replay_tree(
        complete_tree(2, 1),
        Some(ReferenceSource::File("/nonexistent/complete_2_solution.txt".into())),
        &settings,
    )
    .unwrap_err();
    assert!(matches!(err, NodeselError::Configuration(_)));

    // A fresh selector on the next instance is unaffected.
    let sol = solution_file(&[1.0, 0.0]);
    let trace = replay_tree(
        complete_tree(2, 1),
        Some(ReferenceSource::File(sol.path().to_path_buf())),
        &settings,
    )
    .unwrap();
    assert_eq!(trace.stats.reference_reached_at, Some(3));
}

#[test]
fn test_stop_at_reference_with_select_only_oracle() {
    let values = [1.0, 0.0, 1.0];
    let sol = solution_file(&values);
    let settings = NodeselSettings::default()
        .with_method(SelectorKind::OracleSelectOnly)
        .with_stop_at_reference(true);

    let trace = replay_tree(
        complete_tree(values.len(), 5),
        Some(ReferenceSource::File(sol.path().to_path_buf())),
        &settings,
    )
    .unwrap();

    // Neutral comparisons explore breadth-first in opening order, so the
    // reference leaf is found only on the last level.
    assert_eq!(trace.stats.status, ReplayStatus::ReferenceReached);
    assert!(trace.stats.nodes_expanded > values.len() as u64 + 1);
    assert_eq!(trace.order().last().map(|id| id.0 as usize > 7), Some(true));
}
