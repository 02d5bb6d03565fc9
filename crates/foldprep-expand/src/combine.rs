//! Combinatorial job construction: all-vs-all, pulldown, virtual drug
//! screen.
//!
//! A combined job is the concatenation of its source jobs' chains with fresh
//! chain ids (A, B, …) assigned in encounter order; `original_job_name` /
//! `original_id` keep the back-reference. Chain-id assignment restarts at A
//! for every newly constructed job.

use foldprep_common::{chain_label, FoldprepError, Result};
use foldprep_sheet::{Role, SampleRow};

use crate::table::{job_seeds, ChainRecord, ExpandedTable};

/// One combinable unit: a single input job, or several jobs merged into an
/// oligomeric sub-job via a grouping id.
struct Unit {
    name: String,
    records: Vec<ChainRecord>,
}

/// Reassign job name and fresh sequential chain ids; the back-reference
/// fields are left untouched.
fn relabel(records: &mut [ChainRecord], job_name: &str) {
    for (i, rec) in records.iter_mut().enumerate() {
        rec.job_name = job_name.to_string();
        rec.id = chain_label(i);
    }
}

/// Group rows into per-job units in encounter order.
fn input_units(rows: &[SampleRow], n_seeds: Option<u32>) -> Vec<Unit> {
    let mut units: Vec<Unit> = Vec::new();
    for row in rows {
        let group: Vec<&SampleRow> = rows.iter().filter(|r| r.job_name == row.job_name).collect();
        let rec = ChainRecord::from_row(row, job_seeds(&group, n_seeds));
        match units.iter_mut().find(|u| u.name == row.job_name) {
            Some(unit) => unit.records.push(rec),
            None => units.push(Unit { name: row.job_name.clone(), records: vec![rec] }),
        }
    }
    units
}

/// Group rows of one role into units, merging jobs that share a grouping id
/// (bait_id / target_id / drug_id) into one oligomeric sub-job whose name
/// joins the member job names with `_`.
fn role_units(
    rows: &[SampleRow],
    role: Role,
    n_seeds: Option<u32>,
    replicate_counts: bool,
) -> Result<Vec<Unit>> {
    struct Group {
        key: String,
        member_jobs: Vec<String>,
        records: Vec<ChainRecord>,
    }

    let role_rows: Vec<&SampleRow> = rows.iter().filter(|r| r.role == Some(role)).collect();
    let mut groups: Vec<Group> = Vec::new();
    for row in &role_rows {
        let key = row
            .group_id
            .clone()
            .unwrap_or_else(|| format!("job:{}", row.job_name));

        let copies = if replicate_counts { parse_count(row)? } else { 1 };
        let seeds = {
            let group_rows: Vec<&SampleRow> = role_rows
                .iter()
                .filter(|r| {
                    r.group_id.clone().unwrap_or_else(|| format!("job:{}", r.job_name)) == key
                })
                .copied()
                .collect();
            job_seeds(&group_rows, n_seeds)
        };
        let group = match groups.iter_mut().find(|g| g.key == key) {
            Some(g) => g,
            None => {
                groups.push(Group { key, member_jobs: Vec::new(), records: Vec::new() });
                groups.last_mut().expect("just pushed")
            }
        };
        if !group.member_jobs.contains(&row.job_name) {
            group.member_jobs.push(row.job_name.clone());
        }
        for _ in 0..copies {
            group.records.push(ChainRecord::from_row(row, seeds.clone()));
        }
    }

    Ok(groups
        .into_iter()
        .map(|g| {
            let name = g.member_jobs.join("_");
            let mut records = g.records;
            if g.member_jobs.len() > 1 {
                // Merged oligomer: ids from different jobs may clash.
                relabel(&mut records, &name);
            }
            Unit { name, records }
        })
        .collect())
}

fn parse_count(row: &SampleRow) -> Result<usize> {
    match row.count.as_deref() {
        None => Ok(1),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            FoldprepError::Validation(format!(
                "invalid count '{raw}' for chain '{}' in job '{}'",
                row.id, row.job_name
            ))
        }),
    }
}

/// Every unordered pair of input jobs, self-pairs included
/// (choose-2-with-replacement). Standalone input jobs stay in the table.
pub fn all_vs_all(rows: &[SampleRow], n_seeds: Option<u32>) -> ExpandedTable {
    let units = input_units(rows, n_seeds);

    let mut records: Vec<ChainRecord> =
        units.iter().flat_map(|u| u.records.iter().cloned()).collect();

    for i in 0..units.len() {
        for j in i..units.len() {
            let name = format!("{}_{}", units[i].name, units[j].name);
            let mut chains: Vec<ChainRecord> = units[i]
                .records
                .iter()
                .chain(units[j].records.iter())
                .cloned()
                .collect();
            relabel(&mut chains, &name);
            records.extend(chains);
        }
    }
    ExpandedTable::new(records)
}

/// Bait/target pulldown: standalone jobs for every bait and target unit,
/// plus one combined job per (target, bait) cross pair. Target chains come
/// first in the combined job, so chain A is always the (first) target chain.
pub fn pulldown(rows: &[SampleRow], n_seeds: Option<u32>) -> Result<ExpandedTable> {
    let baits = role_units(rows, Role::Bait, n_seeds, false)?;
    let targets = role_units(rows, Role::Target, n_seeds, false)?;

    let mut records: Vec<ChainRecord> = Vec::new();
    for unit in targets.iter().chain(baits.iter()) {
        records.extend(unit.records.iter().cloned());
    }

    for target in &targets {
        for bait in &baits {
            let name = format!("{}_{}", target.name, bait.name);
            let mut chains: Vec<ChainRecord> = target
                .records
                .iter()
                .chain(bait.records.iter())
                .cloned()
                .collect();
            relabel(&mut chains, &name);
            records.extend(chains);
        }
    }
    Ok(ExpandedTable::new(records))
}

/// Virtual drug screen: standalone target units plus one combined job per
/// (target, drug) pair — the target chain(s) and one ligand chain. Rows may
/// carry a copy `count`; every emitted job gets fresh chain ids because
/// replication duplicates the declared ones.
pub fn drug_screen(rows: &[SampleRow], n_seeds: Option<u32>) -> Result<ExpandedTable> {
    let drugs = role_units(rows, Role::Drug, n_seeds, true)?;
    let targets = role_units(rows, Role::Target, n_seeds, true)?;

    let mut records: Vec<ChainRecord> = Vec::new();
    for target in &targets {
        let mut chains = target.records.clone();
        relabel(&mut chains, &target.name);
        records.extend(chains);
    }

    for target in &targets {
        for drug in &drugs {
            let name = format!("{}_{}", target.name, drug.name);
            let mut chains: Vec<ChainRecord> = target
                .records
                .iter()
                .chain(drug.records.iter())
                .cloned()
                .collect();
            relabel(&mut chains, &name);
            records.extend(chains);
        }
    }
    Ok(ExpandedTable::new(records))
}
