//! Derive single-chain precomputation sub-jobs from multimer jobs.

use foldprep_common::sanitised_name;
use foldprep_expand::table::{is_multimer, polymer_count};
use foldprep_expand::{ChainRecord, ExpandedTable};

/// One monomer precomputation unit: a job whose task file feeds the data
/// pipeline and whose artifact other jobs may depend on.
#[derive(Debug, Clone, PartialEq)]
pub struct MonomerUnit {
    /// Job name; the task file is `monomers/{job_name}.json`.
    pub job_name: String,
    /// Polymer chain id inside the task.
    pub chain_id: String,
    pub sequence: String,
    pub seeds: Vec<i64>,
    /// Multimer job this unit was derived from, if any.
    pub derived_from: Option<String>,
}

/// Result of decomposing the deduplicated table.
#[derive(Debug, Default)]
pub struct Decomposition {
    pub has_multimers: bool,
    /// Derived single-chain jobs that still need task files written
    /// (multimer runs only; standalone monomer jobs already have theirs).
    pub derived_table: ExpandedTable,
    /// All canonicalization candidates.
    pub units: Vec<MonomerUnit>,
}

/// Decompose every multimer job into one sub-job per polymer chain, named
/// `{job}_chain-{id}` (sanitized). Standalone jobs that consist of exactly
/// one polymer chain join the candidate set as-is: their artifact can stand
/// in for identical derived chains, which keeps the precomputation worklist
/// minimal.
///
/// Runs with no multimers at all take their monomer jobs directly from the
/// table without the chain-suffix rename.
pub fn decompose(table: &ExpandedTable) -> Decomposition {
    let jobs = table.jobs();
    let has_multimers = jobs.iter().any(|(_, chains)| is_multimer(chains));

    if !has_multimers {
        let units = jobs
            .iter()
            .filter_map(|(name, chains)| {
                let chain = chains.iter().find(|c| c.kind.is_polymer())?;
                (polymer_count(chains) == 1).then(|| MonomerUnit {
                    job_name: (*name).to_string(),
                    chain_id: chain.id.clone(),
                    sequence: chain.sequence.clone(),
                    seeds: chain.seeds.clone(),
                    derived_from: None,
                })
            })
            .collect();
        return Decomposition { has_multimers: false, derived_table: ExpandedTable::default(), units };
    }

    let mut derived: Vec<ChainRecord> = Vec::new();
    let mut units: Vec<MonomerUnit> = Vec::new();

    for (name, chains) in &jobs {
        if is_multimer(chains) {
            for chain in chains.iter().filter(|c| c.kind.is_polymer()) {
                let derived_name = sanitised_name(&format!("{name}_chain-{}", chain.id));
                let mut rec = (*chain).clone();
                rec.job_name = derived_name.clone();
                rec.original_job_name = (*name).to_string();
                rec.original_id = chain.id.clone();
                derived.push(rec);

                units.push(MonomerUnit {
                    job_name: derived_name,
                    chain_id: chain.id.clone(),
                    sequence: chain.sequence.clone(),
                    seeds: chain.seeds.clone(),
                    derived_from: Some((*name).to_string()),
                });
            }
        } else if chains.len() == 1 && chains[0].kind.is_polymer() {
            units.push(MonomerUnit {
                job_name: (*name).to_string(),
                chain_id: chains[0].id.clone(),
                sequence: chains[0].sequence.clone(),
                seeds: chains[0].seeds.clone(),
                derived_from: None,
            });
        }
    }

    Decomposition {
        has_multimers: true,
        derived_table: ExpandedTable::new(derived),
        units,
    }
}
