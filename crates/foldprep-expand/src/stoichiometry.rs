//! Stoichiometry screens: sweep copy-number combinations of a job's chains.
//!
//! Each input row carries a `count` that is a single integer or a
//! `start,end` range; the Cartesian product of all counts within a job group
//! defines one combined job per combination. A parallel summary table
//! records the stoichiometry per generated job plus a truncated sequence
//! fingerprint for human inspection.

use std::path::Path;

use foldprep_common::{chain_label, FoldprepError, Result};
use foldprep_sheet::SampleRow;
use tracing::info;

use crate::table::{job_seeds, ChainRecord, ExpandedTable};

/// Summary row for one generated job.
#[derive(Debug, Clone, PartialEq)]
pub struct StoichiometryRow {
    pub job_name: String,
    pub parent_job: String,
    /// Copy count per monomer position of the parent group.
    pub counts: Vec<usize>,
    /// Truncated sequence fingerprint per monomer position.
    pub prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StoichiometrySummary {
    pub rows: Vec<StoichiometryRow>,
}

impl StoichiometrySummary {
    /// Write the summary as CSV. Parent groups may have different monomer
    /// counts; short rows pad with 0 counts and empty prefixes.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let width = self.rows.iter().map(|r| r.counts.len()).max().unwrap_or(0);

        let mut writer = csv::Writer::from_path(path.as_ref())?;
        let mut header = vec!["job_name".to_string(), "parent_job".to_string()];
        header.extend((1..=width).map(|i| format!("monomer_{i}")));
        header.extend((1..=width).map(|i| format!("monomer_{i}_prefix")));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.job_name.clone(), row.parent_job.clone()];
            for i in 0..width {
                record.push(row.counts.get(i).copied().unwrap_or(0).to_string());
            }
            for i in 0..width {
                record.push(row.prefixes.get(i).cloned().unwrap_or_default());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Expand every job group into one job per count combination.
pub fn expand(
    rows: &[SampleRow],
    n_seeds: Option<u32>,
) -> Result<(ExpandedTable, StoichiometrySummary)> {
    let mut records = Vec::new();
    let mut summary = StoichiometrySummary::default();

    for (parent, group) in job_groups(rows) {
        let seeds = job_seeds(&group, n_seeds);
        let ranges = group
            .iter()
            .map(|row| parse_count_range(row))
            .collect::<Result<Vec<_>>>()?;

        for (combo_idx, combo) in cartesian(&ranges).into_iter().enumerate() {
            let job_name = format!("{parent}_c{combo_idx}");

            summary.rows.push(StoichiometryRow {
                job_name: job_name.clone(),
                parent_job: parent.to_string(),
                counts: combo.clone(),
                prefixes: group.iter().map(|r| sequence_prefix(r)).collect(),
            });

            let mut label = 0usize;
            for (row, &count) in group.iter().zip(&combo) {
                for _ in 0..count {
                    let mut rec = ChainRecord::from_row(row, seeds.clone());
                    rec.job_name = job_name.clone();
                    rec.id = chain_label(label);
                    label += 1;
                    records.push(rec);
                }
            }
        }
    }

    info!(
        generated = summary.rows.len(),
        "Stoichiometry combinations expanded"
    );
    Ok((ExpandedTable::new(records), summary))
}

fn job_groups(rows: &[SampleRow]) -> Vec<(&str, Vec<&SampleRow>)> {
    let mut groups: Vec<(&str, Vec<&SampleRow>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(name, _)| *name == row.job_name) {
            Some((_, members)) => members.push(row),
            None => groups.push((row.job_name.as_str(), vec![row])),
        }
    }
    groups
}

/// `count` is a single integer or an inclusive `start,end` range.
fn parse_count_range(row: &SampleRow) -> Result<Vec<usize>> {
    let raw = row.count.as_deref().unwrap_or("1").trim();
    let invalid = || {
        FoldprepError::Validation(format!(
            "invalid count '{raw}' for chain '{}' in job '{}' \
             (expected an integer or 'start,end')",
            row.id, row.job_name
        ))
    };

    if let Some((start, end)) = raw.split_once(',') {
        let start: usize = start.trim().parse().map_err(|_| invalid())?;
        let end: usize = end.trim().parse().map_err(|_| invalid())?;
        if start > end {
            return Err(invalid());
        }
        Ok((start..=end).collect())
    } else {
        Ok(vec![raw.parse().map_err(|_| invalid())?])
    }
}

/// First 10 characters of the chain's content, for the human-readable
/// summary. Ligands fingerprint their SMILES / CCD representation.
fn sequence_prefix(row: &SampleRow) -> String {
    let source = if !row.sequence.is_empty() {
        row.sequence.clone()
    } else if let Some(smiles) = &row.smiles {
        smiles.clone()
    } else if let Some(ccd) = &row.ccd_codes {
        ccd.join(",")
    } else {
        String::new()
    };
    if source.chars().count() > 10 {
        let head: String = source.chars().take(10).collect();
        format!("{head}...")
    } else {
        source
    }
}

/// All combinations of one value per range, rightmost position varying
/// fastest.
fn cartesian(ranges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut combos: Vec<Vec<usize>> = vec![Vec::new()];
    for range in ranges {
        let mut next = Vec::with_capacity(combos.len() * range.len());
        for combo in &combos {
            for &value in range {
                let mut extended = combo.clone();
                extended.push(value);
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}
