//! End-to-end preprocessing pipeline.
//!
//! One-shot batch transformation for a single run:
//!   1. Read and validate the sample sheet for the chosen mode
//!   2. Expand the experiment design into the full job table
//!   3. Collapse computation-equivalent jobs, report duplicates
//!   4. Serialize task files (multimers fan out per seed)
//!   5. Decompose multimers into single-chain precomputation sub-jobs
//!   6. Canonicalize shared sequences, build the dependency map
//!   7. Write the three scheduler manifests and collect garbage
//!
//! Every derivation is a pure function of the deduplicated table, so a
//! crashed run is recovered by simply re-invoking it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use foldprep_common::RunLayout;
use foldprep_depmap::{build_manifests, canonicalize, collect_garbage, decompose, write_manifests};
use foldprep_expand::{dedup_jobs, expand, write_duplicate_report};
use foldprep_sheet::{read_sample_sheet, Mode};
use foldprep_tasks::write_job_tasks;

/// Parameters of one preprocessing run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub sample_sheet: PathBuf,
    pub output_dir: PathBuf,
    pub mode: Mode,
    /// Overrides every per-row seed list with `1..=n_seeds`.
    pub n_seeds: Option<u32>,
    /// Models per seed in the inference worklist.
    pub n_samples: u32,
    /// Also schedule the canonical monomer components for inference.
    pub predict_individual_components: bool,
}

/// What one run produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    pub total_jobs: usize,
    pub unique_jobs: usize,
    pub duplicate_jobs: usize,
    pub monomer_task_files: usize,
    pub multimer_task_files: usize,
    pub precomputations: usize,
    pub dependency_edges: usize,
    pub inference_rows: usize,
    pub garbage_collected: usize,
}

pub fn run(opts: &RunOptions) -> Result<RunReport> {
    info!(
        sample_sheet = %opts.sample_sheet.display(),
        output_dir = %opts.output_dir.display(),
        mode = opts.mode.as_str(),
        n_seeds = ?opts.n_seeds,
        n_samples = opts.n_samples,
        "Starting preprocessing run"
    );

    let layout = RunLayout::new(&opts.output_dir);

    // Validation happens entirely before any output is written.
    let rows = read_sample_sheet(&opts.sample_sheet, opts.mode)
        .with_context(|| format!("reading sample sheet {}", opts.sample_sheet.display()))?;
    let expansion = expand(&rows, opts.mode, opts.n_seeds)?;
    let (table, duplicates) = dedup_jobs(expansion.table);

    std::fs::create_dir_all(layout.metadata_dir())?;
    write_duplicate_report(
        &duplicates,
        &layout.duplicate_summary(),
        &layout.duplicate_full_mapping(),
    )?;
    if let Some(summary) = &expansion.stoichiometry_summary {
        summary.write_csv(layout.stoichiometry_summary())?;
    }

    let mut tasks = write_job_tasks(&table, &layout)?;

    let decomp = decompose(&table);
    if decomp.has_multimers {
        let derived = write_job_tasks(&decomp.derived_table, &layout)?;
        tasks.monomer_files += derived.monomer_files;
    }

    let canon = canonicalize(&decomp.units, &layout);
    let manifests = build_manifests(
        &table,
        &decomp,
        &canon,
        &layout,
        opts.n_samples,
        opts.predict_individual_components,
    )?;
    write_manifests(&manifests, &layout)?;
    let garbage_collected = collect_garbage(&manifests, &layout)?;

    let report = RunReport {
        total_jobs: duplicates.total_jobs,
        unique_jobs: duplicates.unique_jobs,
        duplicate_jobs: duplicates.duplicate_jobs(),
        monomer_task_files: tasks.monomer_files,
        multimer_task_files: tasks.multimer_files,
        precomputations: manifests.data_pipeline.len(),
        dependency_edges: manifests.edges.len(),
        inference_rows: manifests.inference.len(),
        garbage_collected,
    };

    info!(
        monomer_dir = %layout.monomer_task_dir().display(),
        multimer_dir = %layout.multimer_task_dir().display(),
        metadata_dir = %layout.metadata_dir().display(),
        "Preprocessing completed successfully"
    );
    Ok(report)
}
