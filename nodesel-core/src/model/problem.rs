//! Problem instance metadata visible to node selectors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::search::VarId;

/// Variable integrality type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    /// Continuous variable.
    #[default]
    Continuous,

    /// General integer variable.
    Integer,

    /// Binary variable.
    Binary,
}

/// One entry of the variable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Variable name as written in solution files.
    pub name: String,

    /// Integrality type.
    #[serde(default)]
    pub var_type: VarType,
}

impl VariableInfo {
    /// Create a variable entry.
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
        }
    }
}

/// Per-instance information handed to selectors at search start.
///
/// `VarId(i)` refers to `variables[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemMetadata {
    /// Instance name.
    pub name: String,

    /// Variable table.
    pub variables: Vec<VariableInfo>,
}

impl ProblemMetadata {
    /// Create metadata for a named instance.
    pub fn new(name: impl Into<String>, variables: Vec<VariableInfo>) -> Self {
        Self {
            name: name.into(),
            variables,
        }
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Number of binary variables.
    pub fn num_binary(&self) -> usize {
        self.count(VarType::Binary)
    }

    /// Number of general integer variables (binaries excluded).
    pub fn num_integer(&self) -> usize {
        self.count(VarType::Integer)
    }

    fn count(&self, var_type: VarType) -> usize {
        self.variables
            .iter()
            .filter(|v| v.var_type == var_type)
            .count()
    }

    /// Name lookup table.
    pub fn index_by_name(&self) -> HashMap<&str, VarId> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name.as_str(), VarId(i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let meta = ProblemMetadata::new(
            "p",
            vec![
                VariableInfo::new("x", VarType::Binary),
                VariableInfo::new("y", VarType::Integer),
                VariableInfo::new("z", VarType::Continuous),
                VariableInfo::new("w", VarType::Binary),
            ],
        );
        assert_eq!(meta.num_vars(), 4);
        assert_eq!(meta.num_binary(), 2);
        assert_eq!(meta.num_integer(), 1);
        assert_eq!(meta.index_by_name()["y"], VarId(1));
    }
}
