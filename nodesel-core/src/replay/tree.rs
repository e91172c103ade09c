//! Recorded search trees exported by an external engine.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NodeselError, NodeselResult};
use crate::model::ProblemMetadata;
use crate::search::{NodeId, SearchNode};

/// A complete branch-and-bound tree plus the instance it was built for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedTree {
    /// Instance metadata.
    pub problem: ProblemMetadata,

    /// Every node of the tree, in creation order.
    pub nodes: Vec<SearchNode>,
}

/// Parent/child index over a validated tree.
#[derive(Debug, Clone)]
pub(crate) struct TreeIndex {
    /// Position of each node id in `nodes`.
    pub by_id: HashMap<NodeId, usize>,

    /// Children positions, in creation order.
    pub children: Vec<Vec<usize>>,

    /// Position of the root.
    pub root: usize,
}

impl RecordedTree {
    /// Create a tree from its parts.
    pub fn new(problem: ProblemMetadata, nodes: Vec<SearchNode>) -> Self {
        Self { problem, nodes }
    }

    /// Read a tree from a JSON file.
    pub fn read<P: AsRef<Path>>(path: P) -> NodeselResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Write the tree as JSON.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> NodeselResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check structural consistency and build the parent/child index.
    ///
    /// Requires unique ids, exactly one root at depth 0, existing parents,
    /// `depth = parent depth + 1`, branchings extending the parent's, and
    /// variables inside the instance's variable table.
    pub(crate) fn index(&self) -> NodeselResult<TreeIndex> {
        let mut by_id = HashMap::with_capacity(self.nodes.len());
        for (pos, node) in self.nodes.iter().enumerate() {
            if by_id.insert(node.id, pos).is_some() {
                return Err(invalid(format!("duplicate node id {}", node.id)));
            }
        }

        let mut root = None;
        let mut children = vec![Vec::new(); self.nodes.len()];
        let num_vars = self.problem.num_vars();

        for (pos, node) in self.nodes.iter().enumerate() {
            if let Some(d) = node.branchings.iter().find(|d| d.var.0 >= num_vars) {
                return Err(invalid(format!(
                    "node {} branches on variable {} but the instance has {}",
                    node.id, d.var.0, num_vars
                )));
            }

            let Some(parent_id) = node.parent else {
                if node.depth != 0 {
                    return Err(invalid(format!(
                        "node {} has no parent but depth {}",
                        node.id, node.depth
                    )));
                }
                if let Some(other) = root.replace(pos) {
                    return Err(invalid(format!(
                        "two roots: {} and {}",
                        self.nodes[other].id, node.id
                    )));
                }
                continue;
            };

            let parent_pos = *by_id.get(&parent_id).ok_or_else(|| {
                invalid(format!("node {} has unknown parent {}", node.id, parent_id))
            })?;
            let parent = &self.nodes[parent_pos];

            if node.depth != parent.depth + 1 {
                return Err(invalid(format!(
                    "node {} at depth {} below parent {} at depth {}",
                    node.id, node.depth, parent.id, parent.depth
                )));
            }
            if !node.branchings.starts_with(&parent.branchings) {
                return Err(invalid(format!(
                    "branchings of node {} do not extend those of parent {}",
                    node.id, parent.id
                )));
            }

            children[parent_pos].push(pos);
        }

        let root = root.ok_or_else(|| invalid("no root node".to_string()))?;

        Ok(TreeIndex {
            by_id,
            children,
            root,
        })
    }

    /// Validate the tree.
    pub fn validate(&self) -> NodeselResult<()> {
        self.index().map(|_| ())
    }
}

fn invalid(msg: String) -> NodeselError {
    NodeselError::InvalidTree(msg)
}
