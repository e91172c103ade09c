//! Problem metadata and reference solutions.

mod problem;
mod reference;

pub use problem::{ProblemMetadata, VarType, VariableInfo};
pub use reference::{ReferenceSolution, ReferenceSource, SolutionFile};
