//! The expanded entity table: one record per (job, chain) pair.

use foldprep_sheet::{EntityKind, MsaOption, SampleRow};
use serde::{Deserialize, Serialize};

/// One chain of one (possibly combinatorially constructed) job.
///
/// Unlike `SampleRow`, mode-specific role columns are gone, the seed list is
/// resolved, and the source job/chain are kept for back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub job_name: String,
    pub kind: EntityKind,
    pub id: String,
    pub sequence: String,
    pub modifications: Option<String>,
    pub msa_option: MsaOption,
    pub unpaired_msa: Option<String>,
    pub paired_msa: Option<String>,
    pub templates: Option<String>,
    pub ccd_codes: Option<Vec<String>>,
    pub smiles: Option<String>,
    /// Resolved seed list, never empty.
    pub seeds: Vec<i64>,
    pub bonded_atom_pairs: Option<String>,
    pub user_ccd: Option<String>,
    /// Job this chain came from before combination/replication.
    pub original_job_name: String,
    /// Chain id this chain had before relabeling.
    pub original_id: String,
}

impl ChainRecord {
    /// Build a record from a normalized row with the job's resolved seeds.
    pub fn from_row(row: &SampleRow, seeds: Vec<i64>) -> Self {
        Self {
            job_name: row.job_name.clone(),
            kind: row.kind,
            id: row.id.clone(),
            sequence: row.sequence.clone(),
            modifications: row.modifications.clone(),
            msa_option: row.msa_option,
            unpaired_msa: row.unpaired_msa.clone(),
            paired_msa: row.paired_msa.clone(),
            templates: row.templates.clone(),
            ccd_codes: row.ccd_codes.clone(),
            smiles: row.smiles.clone(),
            seeds,
            bonded_atom_pairs: row.bonded_atom_pairs.clone(),
            user_ccd: row.user_ccd.clone(),
            original_job_name: row.job_name.clone(),
            original_id: row.id.clone(),
        }
    }
}

/// Resolve one job's seed list: `--n-seeds` wins over the sheet column, the
/// first non-empty `model_seeds` across the job's rows applies otherwise,
/// and an unspecified list defaults to the single seed 1.
pub fn job_seeds(rows: &[&SampleRow], n_seeds: Option<u32>) -> Vec<i64> {
    if let Some(n) = n_seeds {
        return (1..=i64::from(n)).collect();
    }
    rows.iter()
        .map(|r| &r.model_seeds)
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| vec![1])
}

/// Expanded table with job grouping helpers. Record order is meaningful:
/// deduplication keeps the first-encountered representative and chain order
/// within a job is the serialization order.
#[derive(Debug, Clone, Default)]
pub struct ExpandedTable {
    pub records: Vec<ChainRecord>,
}

impl ExpandedTable {
    pub fn new(records: Vec<ChainRecord>) -> Self {
        Self { records }
    }

    /// Unique job names in encounter order.
    pub fn job_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for r in &self.records {
            if seen.insert(r.job_name.as_str()) {
                names.push(r.job_name.as_str());
            }
        }
        names
    }

    /// Jobs with their chains, in encounter order.
    pub fn jobs(&self) -> Vec<(&str, Vec<&ChainRecord>)> {
        self.job_names()
            .into_iter()
            .map(|name| (name, self.job(name)))
            .collect()
    }

    pub fn job(&self, name: &str) -> Vec<&ChainRecord> {
        self.records.iter().filter(|r| r.job_name == name).collect()
    }

    /// Whether any job in the table is a multimer.
    pub fn has_multimers(&self) -> bool {
        self.jobs().iter().any(|(_, chains)| is_multimer(chains))
    }
}

/// A job is a multimer iff it has more than one polymer (protein/RNA) chain;
/// DNA and ligand chains never count.
pub fn is_multimer(chains: &[&ChainRecord]) -> bool {
    polymer_count(chains) > 1
}

pub fn polymer_count(chains: &[&ChainRecord]) -> usize {
    chains.iter().filter(|c| c.kind.is_polymer()).count()
}

/// Pass-through expansion for custom mode: jobs are the groups already
/// present in the sheet.
pub fn from_rows(rows: &[SampleRow], n_seeds: Option<u32>) -> ExpandedTable {
    let mut seeds_by_job: std::collections::HashMap<&str, Vec<i64>> =
        std::collections::HashMap::new();
    for row in rows {
        if !seeds_by_job.contains_key(row.job_name.as_str()) {
            let group: Vec<&SampleRow> =
                rows.iter().filter(|r| r.job_name == row.job_name).collect();
            seeds_by_job.insert(row.job_name.as_str(), job_seeds(&group, n_seeds));
        }
    }
    ExpandedTable::new(
        rows.iter()
            .map(|r| ChainRecord::from_row(r, seeds_by_job[r.job_name.as_str()].clone()))
            .collect(),
    )
}
