//! Batch driver replaying recorded branch-and-bound trees under a node
//! selection method.

mod batch;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use nodesel_core::{NativeOrdering, NodeselSettings, SelectorKind};

/// Node selection method.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Oracle steering both selection and comparison.
    Oracle,
    /// Oracle classifying nodes without steering comparisons.
    #[value(name = "oracle_nodesel")]
    OracleNodesel,
    /// Best estimate.
    Estimate,
    /// Best bound.
    Bfs,
    /// Breadth first.
    Breadth,
    /// Depth first.
    Dfs,
    /// Mix of bound and estimate.
    Hybrid,
    /// Depth first with periodic best-bound restarts.
    Restartdfs,
    /// Upper confidence bounds on the tree.
    Uct,
}

impl From<Method> for SelectorKind {
    fn from(method: Method) -> Self {
        match method {
            Method::Oracle => SelectorKind::Oracle,
            Method::OracleNodesel => SelectorKind::OracleSelectOnly,
            Method::Estimate => SelectorKind::Native(NativeOrdering::BestEstimate),
            Method::Bfs => SelectorKind::Native(NativeOrdering::BestFirst),
            Method::Breadth => SelectorKind::Native(NativeOrdering::BreadthFirst),
            Method::Dfs => SelectorKind::Native(NativeOrdering::DepthFirst),
            Method::Hybrid => SelectorKind::Native(NativeOrdering::HybridEstimate),
            Method::Restartdfs => SelectorKind::Native(NativeOrdering::RestartDepthFirst),
            Method::Uct => SelectorKind::Native(NativeOrdering::Uct),
        }
    }
}

/// Replay every `*.tree.json` of a directory and write per-instance stats.
#[derive(Parser, Debug)]
#[command(name = "nodesel-bench", version, about)]
struct Cli {
    /// Node selection method.
    #[arg(value_enum)]
    method: Method,

    /// Directory holding `<name>.tree.json` and `<name>_solution.txt` files.
    dir: PathBuf,

    /// Relative tolerance for bound comparisons.
    #[arg(long)]
    epsilon: Option<f64>,

    /// Maximum nodes expanded per instance.
    #[arg(long)]
    max_nodes: Option<u64>,

    /// Stop an instance once the reference leaf is expanded.
    #[arg(long)]
    stop_at_reference: bool,

    /// Log replay progress.
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Result<NodeselSettings> {
        let mut settings = if self.verbose {
            NodeselSettings::verbose()
        } else {
            NodeselSettings::default()
        }
        .with_method(self.method.into())
        .with_stop_at_reference(self.stop_at_reference);

        if let Some(epsilon) = self.epsilon {
            if !(epsilon.is_finite() && epsilon >= 0.0) {
                bail!("--epsilon must be a finite non-negative number, got {}", epsilon);
            }
            settings = settings.with_epsilon(epsilon);
        }
        if let Some(max_nodes) = self.max_nodes {
            settings = settings.with_max_nodes(max_nodes);
        }
        Ok(settings)
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let settings = cli.settings()?;
    let summary = batch::run_batch(&cli.dir, &settings)?;

    println!(
        "{}: {} instances replayed, {} failed",
        settings.method,
        summary.solved.len(),
        summary.failed.len()
    );
    for (stem, err) in &summary.failed {
        println!("  FAILED {}: {}", stem, err);
    }
    Ok(summary.failed.is_empty())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
