//! Oracle-guided node classification and ordering.

mod classifier;
mod policy;

pub use classifier::{ClassifierStats, NodeClassifier, Verdict};
pub use policy::{OraclePolicy, PolicyDiagnostics, SelectionTarget};
