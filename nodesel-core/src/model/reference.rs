//! Reference (known optimal) solutions and their file format.
//!
//! Solution files use the solver's native text format:
//!
//! ```text
//! solution status: optimal solution found
//! objective value:                     -3
//! x1                                      1 	(obj:-1)
//! ```
//!
//! Only non-zero assignments are listed; every other variable is zero.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use super::ProblemMetadata;
use crate::error::{NodeselError, NodeselResult};
use crate::numerics::parse_bound;
use crate::search::VarId;

/// Parsed solution file, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionFile {
    /// Text after `solution status:`, if present.
    pub status: Option<String>,

    /// Value after `objective value:`, if present.
    pub objective: Option<f64>,

    /// Assignments in file order.
    pub values: Vec<(String, f64)>,
}

impl SolutionFile {
    /// Read a solution file, decompressing `.gz` files.
    pub fn read<P: AsRef<Path>>(path: P) -> NodeselResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            NodeselError::Configuration(format!(
                "Failed to open solution file {}: {}",
                path.display(),
                e
            ))
        })?;

        let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Self::parse(BufReader::new(reader)).map_err(|e| match e {
            NodeselError::Configuration(msg) => {
                NodeselError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse solution text from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> NodeselResult<Self> {
        let mut sol = SolutionFile::default();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                NodeselError::Configuration(format!("line {}: read failed: {}", line_num + 1, e))
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix("solution status:") {
                sol.status = Some(rest.trim().to_string());
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("objective value:") {
                sol.objective = Some(parse_bound(rest.trim()).ok_or_else(|| {
                    NodeselError::Configuration(format!(
                        "line {}: invalid objective value '{}'",
                        line_num + 1,
                        rest.trim()
                    ))
                })?);
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let (name, raw) = match (tokens.next(), tokens.next()) {
                (Some(name), Some(raw)) => (name, raw),
                _ => {
                    return Err(NodeselError::Configuration(format!(
                        "line {}: expected '<name> <value>', got '{}'",
                        line_num + 1,
                        trimmed
                    )))
                }
            };
            // Anything after the value is the "(obj:...)" annotation.
            let value = parse_bound(raw).ok_or_else(|| {
                NodeselError::Configuration(format!(
                    "line {}: invalid value '{}' for {}",
                    line_num + 1,
                    raw,
                    name
                ))
            })?;

            if let Some(first) = seen.insert(name.to_string(), line_num + 1) {
                return Err(NodeselError::Configuration(format!(
                    "line {}: variable {} already assigned on line {}",
                    line_num + 1,
                    name,
                    first
                )));
            }
            sol.values.push((name.to_string(), value));
        }

        Ok(sol)
    }

    /// Value assigned to `name`, if listed.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// Known optimal assignment for one instance, indexed by `VarId`.
///
/// Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSolution {
    values: Vec<f64>,
    objective: Option<f64>,
}

impl ReferenceSolution {
    /// Build directly from a dense value vector.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            values,
            objective: None,
        }
    }

    /// Map a parsed file onto the instance's variable table.
    ///
    /// Variables the file omits are zero. Names the instance does not know
    /// are logged and skipped.
    pub fn resolve(file: &SolutionFile, problem: &ProblemMetadata) -> Self {
        let index = problem.index_by_name();
        let mut values = vec![0.0; problem.num_vars()];
        let mut unknown = 0usize;

        for (name, value) in &file.values {
            match index.get(name.as_str()) {
                Some(VarId(i)) => values[*i] = *value,
                None => {
                    unknown += 1;
                    log::warn!(
                        "Solution for '{}' assigns unknown variable {}, skipping",
                        problem.name,
                        name
                    );
                }
            }
        }

        log::debug!(
            "Resolved reference solution for '{}': {} assignments, {} unknown",
            problem.name,
            file.values.len() - unknown,
            unknown
        );

        Self {
            values,
            objective: file.objective,
        }
    }

    /// Reference value of a variable (zero when out of range).
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.0).copied().unwrap_or(0.0)
    }

    /// Objective value stated in the file.
    pub fn objective(&self) -> Option<f64> {
        self.objective
    }

    /// Number of variables covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no variable is covered.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where an oracle selector gets its reference solution from.
#[derive(Debug, Clone)]
pub enum ReferenceSource {
    /// Read the file at every search start.
    File(PathBuf),

    /// Already parsed solution.
    Preloaded(SolutionFile),
}

impl ReferenceSource {
    /// Load and resolve the reference solution for `problem`.
    pub fn load(&self, problem: &ProblemMetadata) -> NodeselResult<ReferenceSolution> {
        match self {
            ReferenceSource::File(path) => {
                let file = SolutionFile::read(path)?;
                Ok(ReferenceSolution::resolve(&file, problem))
            }
            ReferenceSource::Preloaded(file) => Ok(ReferenceSolution::resolve(file, problem)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VarType, VariableInfo};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "solution status: optimal solution found\n\
                          objective value:                     -3\n\
                          x1                                      1 \t(obj:-1)\n\
                          x3                                      2 \t(obj:-1)\n";

    fn meta() -> ProblemMetadata {
        ProblemMetadata::new(
            "sample",
            vec![
                VariableInfo::new("x1", VarType::Binary),
                VariableInfo::new("x2", VarType::Binary),
                VariableInfo::new("x3", VarType::Integer),
            ],
        )
    }

    #[test]
    fn test_parse_sample() {
        let sol = SolutionFile::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(sol.status.as_deref(), Some("optimal solution found"));
        assert_eq!(sol.objective, Some(-3.0));
        assert_eq!(sol.values.len(), 2);
        assert_eq!(sol.get("x3"), Some(2.0));
        assert_eq!(sol.get("x2"), None);
    }

    #[test]
    fn test_parse_infinities_and_comments() {
        let text = "# comment\n\nu  +infinity\nv -inf (obj:0)\n";
        let sol = SolutionFile::parse(text.as_bytes()).unwrap();
        assert_eq!(sol.get("u"), Some(f64::INFINITY));
        assert_eq!(sol.get("v"), Some(f64::NEG_INFINITY));
        assert!(sol.status.is_none());
    }

    #[test]
    fn test_parse_errors() {
        let missing_value = SolutionFile::parse("x1\n".as_bytes()).unwrap_err();
        assert!(matches!(missing_value, NodeselError::Configuration(_)));

        let bad_value = SolutionFile::parse("x1 one\n".as_bytes()).unwrap_err();
        assert!(bad_value.to_string().contains("invalid value"));

        let duplicate = SolutionFile::parse("x1 1\nx1 0\n".as_bytes()).unwrap_err();
        assert!(duplicate.to_string().contains("already assigned"));
    }

    #[test]
    fn test_resolve_fills_zeros_and_skips_unknown() {
        let text = "x3 2\nghost 5\n";
        let file = SolutionFile::parse(text.as_bytes()).unwrap();
        let reference = ReferenceSolution::resolve(&file, &meta());

        assert_eq!(reference.len(), 3);
        assert_eq!(reference.value(VarId(0)), 0.0);
        assert_eq!(reference.value(VarId(2)), 2.0);
        assert_eq!(reference.value(VarId(17)), 0.0);
        assert!(reference.objective().is_none());
    }

    #[test]
    fn test_read_plain_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(SAMPLE.as_bytes()).expect("Failed to write temp file");
        file.flush().expect("Failed to flush temp file");

        let source = ReferenceSource::File(file.path().to_path_buf());
        let reference = source.load(&meta()).unwrap();
        assert_eq!(reference.value(VarId(0)), 1.0);
        assert_eq!(reference.objective(), Some(-3.0));
    }

    #[test]
    fn test_read_gzip_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("p_solution.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let sol = SolutionFile::read(&path).unwrap();
        assert_eq!(sol.get("x1"), Some(1.0));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = SolutionFile::read("/nonexistent/p_solution.txt").unwrap_err();
        assert!(matches!(err, NodeselError::Configuration(_)));
    }
}
