//! foldprep — entry point for the preprocessing binary.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use foldprep_cli::{run, RunOptions};
use foldprep_sheet::Mode;

#[derive(Debug, Parser)]
#[command(
    name = "foldprep",
    version,
    about = "Expand a sample sheet into inference tasks and scheduler manifests"
)]
struct Cli {
    /// Tab- or comma-separated sample sheet.
    sample_sheet: PathBuf,

    /// Run output directory.
    output_dir: PathBuf,

    /// Run mode: custom, all-vs-all, pulldown, virtual-drug-screen or
    /// stoichio-screen.
    #[arg(long, default_value = "custom", env = "FOLDPREP_MODE")]
    mode: String,

    /// Number of random seeds; overrides the model_seeds column. Useful for
    /// massive sampling.
    #[arg(long, env = "FOLDPREP_N_SEEDS")]
    n_seeds: Option<u32>,

    /// Number of models per seed.
    #[arg(long, default_value_t = 5, env = "FOLDPREP_N_SAMPLES")]
    n_samples: u32,

    /// Also predict the individual components of multimeric samples.
    #[arg(long)]
    predict_individual_components: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let opts = RunOptions {
        sample_sheet: cli.sample_sheet,
        output_dir: cli.output_dir,
        mode: Mode::parse(&cli.mode)?,
        n_seeds: cli.n_seeds,
        n_samples: cli.n_samples,
        predict_individual_components: cli.predict_individual_components,
    };

    let report = run(&opts)?;
    info!(
        total_jobs = report.total_jobs,
        unique_jobs = report.unique_jobs,
        duplicates = report.duplicate_jobs,
        task_files = report.monomer_task_files + report.multimer_task_files,
        precomputations = report.precomputations,
        inference_rows = report.inference_rows,
        garbage_collected = report.garbage_collected,
        "Run finished"
    );
    Ok(())
}
