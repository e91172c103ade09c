//! Error types for node selection.

use thiserror::Error;

use crate::search::NodeId;

/// Broken calling-sequence contracts between the engine and a selector.
///
/// These are programming errors: the current instance's search must stop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A node was handed to the classifier a second time.
    #[error("node {node} is already classified")]
    AlreadyClassified {
        /// Offending node.
        node: NodeId,
    },

    /// A node was classified before its (non-root) parent.
    #[error("node {node} classified before its parent {parent}")]
    ParentUnclassified {
        /// Offending node.
        node: NodeId,
        /// Its unclassified parent.
        parent: NodeId,
    },

    /// A node below the root carries no parent link.
    #[error("node {node} at depth {depth} has no parent")]
    OrphanNode {
        /// Offending node.
        node: NodeId,
        /// Its reported depth.
        depth: usize,
    },

    /// A comparison reached a node that was never classified.
    #[error("node {node} compared before being classified")]
    Unclassified {
        /// Offending node.
        node: NodeId,
    },

    /// A selector picked a node that is not open.
    #[error("node {node} selected but not open")]
    NotOpen {
        /// Offending node.
        node: NodeId,
    },
}

/// Errors that can occur while selecting nodes.
#[derive(Error, Debug)]
pub enum NodeselError {
    /// Reference solution unavailable or selector misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Calling-sequence contract broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    /// Recorded search tree is malformed
    #[error("Invalid tree: {0}")]
    InvalidTree(String),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for node selection operations.
pub type NodeselResult<T> = Result<T, NodeselError>;
