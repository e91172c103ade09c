//! Replay every recorded tree of a directory under one method.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nodesel_core::{replay_tree, NodeselSettings, RecordedTree, ReferenceSource, ReplayStats};

const TREE_SUFFIX: &str = ".tree.json";

/// One recorded instance found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// File name minus `.tree.json`.
    pub stem: String,

    /// Recorded tree.
    pub tree_path: PathBuf,
}

impl Instance {
    /// `<dir>/<stem>_solution.txt`, or its gzipped variant when only that exists.
    pub fn solution_path(&self, dir: &Path) -> Option<PathBuf> {
        let plain = dir.join(format!("{}_solution.txt", self.stem));
        if plain.is_file() {
            return Some(plain);
        }
        let gz = dir.join(format!("{}_solution.txt.gz", self.stem));
        gz.is_file().then_some(gz)
    }

    /// `<dir>/<stem>_<method>_stats.json`.
    pub fn stats_path(&self, dir: &Path, method: &str) -> PathBuf {
        dir.join(format!("{}_{}_stats.json", self.stem, method))
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Statistics of every instance that replayed.
    pub solved: Vec<ReplayStats>,

    /// Stems of instances that failed, with the error.
    pub failed: Vec<(String, String)>,
}

/// Recorded trees in `dir`, sorted by file name.
pub fn discover(dir: &Path) -> Result<Vec<Instance>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut instances = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(TREE_SUFFIX) {
            if !stem.is_empty() && path.is_file() {
                instances.push(Instance {
                    stem: stem.to_string(),
                    tree_path: path.clone(),
                });
            }
        }
    }
    instances.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(instances)
}

/// Replay one instance and write its stats file.
pub fn run_instance(
    dir: &Path,
    instance: &Instance,
    settings: &NodeselSettings,
) -> Result<ReplayStats> {
    let tree = RecordedTree::read(&instance.tree_path)
        .with_context(|| format!("Failed to load tree {}", instance.tree_path.display()))?;

    let reference = if settings.method.needs_reference() {
        let path = instance.solution_path(dir).with_context(|| {
            format!(
                "No {}_solution.txt(.gz) in {} for method {}",
                instance.stem,
                dir.display(),
                settings.method
            )
        })?;
        Some(ReferenceSource::File(path))
    } else {
        None
    };

    let trace = replay_tree(tree, reference, settings)
        .with_context(|| format!("Replay of {} failed", instance.stem))?;

    let out = instance.stats_path(dir, settings.method.method_name());
    let mut writer = BufWriter::new(
        File::create(&out).with_context(|| format!("Failed to create {}", out.display()))?,
    );
    serde_json::to_writer_pretty(&mut writer, &trace)?;
    writer.flush()?;

    Ok(trace.stats)
}

/// Replay every instance of `dir`; failures are logged and counted.
pub fn run_batch(dir: &Path, settings: &NodeselSettings) -> Result<BatchSummary> {
    let instances = discover(dir)?;
    if instances.is_empty() {
        log::warn!("No *{} files in {}", TREE_SUFFIX, dir.display());
    }

    let mut summary = BatchSummary::default();
    for instance in &instances {
        match run_instance(dir, instance, settings) {
            Ok(stats) => {
                log::info!(
                    "{}: {:?}, {} nodes, reference at {}",
                    instance.stem,
                    stats.status,
                    stats.nodes_expanded,
                    stats
                        .reference_reached_at
                        .map_or_else(|| "-".to_string(), |n| n.to_string())
                );
                summary.solved.push(stats);
            }
            Err(e) => {
                log::error!("{}: {:#}", instance.stem, e);
                summary.failed.push((instance.stem.clone(), format!("{:#}", e)));
            }
        }
    }
    Ok(summary)
}
