//! foldprep-expand — Design-mode expansion and content-based deduplication.
//!
//! Turns normalized sample rows into the full expanded entity table implied
//! by the experiment design (one row per (job, chain) pair), then collapses
//! jobs whose chain content is identical:
//!   1. Expand per mode (custom, all-vs-all, pulldown, virtual-drug-screen,
//!      stoichiometry-screen)
//!   2. Fingerprint every job over its sorted chain records
//!   3. Keep one representative per fingerprint, report the rest
//!
//! Live screens can generate tens of thousands of combined jobs differing
//! only by name order, so deduplication is one hash per job in a single
//! pass.

pub mod combine;
pub mod dedup;
pub mod stoichiometry;
pub mod table;

use foldprep_common::Result;
use foldprep_sheet::{Mode, SampleRow};

pub use dedup::{dedup_jobs, write_duplicate_report, DuplicateReport};
pub use stoichiometry::StoichiometrySummary;
pub use table::{ChainRecord, ExpandedTable};

/// Result of design-mode expansion, before deduplication.
#[derive(Debug)]
pub struct Expansion {
    pub table: ExpandedTable,
    /// Present in stoichiometry-screen mode only.
    pub stoichiometry_summary: Option<StoichiometrySummary>,
}

/// Expand normalized rows into the full set of jobs the design implies.
///
/// `n_seeds` overrides every per-row seed list with `1..=n_seeds`.
pub fn expand(rows: &[SampleRow], mode: Mode, n_seeds: Option<u32>) -> Result<Expansion> {
    let table = match mode {
        Mode::Custom              => table::from_rows(rows, n_seeds),
        Mode::AllVsAll            => combine::all_vs_all(rows, n_seeds),
        Mode::Pulldown            => combine::pulldown(rows, n_seeds)?,
        Mode::VirtualDrugScreen   => combine::drug_screen(rows, n_seeds)?,
        Mode::StoichiometryScreen => {
            let (table, summary) = stoichiometry::expand(rows, n_seeds)?;
            return Ok(Expansion { table, stoichiometry_summary: Some(summary) });
        }
    };
    Ok(Expansion { table, stoichiometry_summary: None })
}
