//! Content-based job deduplication.
//!
//! Two jobs whose ordered chain-content signatures are identical are
//! computation-equivalent; only the first-encountered one is kept. The
//! signature is SHA-256 over a canonical length-prefixed tuple encoding of
//! the chains sorted by (kind, id, sequence) — never over serialized JSON,
//! so it cannot drift with float or locale formatting.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

use foldprep_common::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::table::{ChainRecord, ExpandedTable};

/// Jobs removed per kept representative.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub kept: String,
    pub removed: Vec<String>,
}

/// Outcome of one deduplication pass.
#[derive(Debug, Clone)]
pub struct DuplicateReport {
    pub total_jobs: usize,
    pub unique_jobs: usize,
    /// Groups in encounter order, including singletons (empty `removed`).
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    pub fn duplicate_jobs(&self) -> usize {
        self.total_jobs - self.unique_jobs
    }

    fn duplicate_groups(&self) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(|g| !g.removed.is_empty())
    }
}

/// Content signature of one job's chains. Excludes the job name and the
/// back-reference columns: differently-named jobs with identical chain
/// content must collapse.
pub fn job_signature(chains: &[&ChainRecord]) -> [u8; 32] {
    let mut sorted: Vec<&&ChainRecord> = chains.iter().collect();
    sorted.sort_by(|a, b| {
        (a.kind, a.id.as_str(), a.sequence.as_str())
            .cmp(&(b.kind, b.id.as_str(), b.sequence.as_str()))
    });

    let mut hasher = Sha256::new();
    for chain in sorted {
        feed(&mut hasher, chain.kind.as_str());
        feed(&mut hasher, &chain.id);
        feed(&mut hasher, &chain.sequence);
        feed_opt(&mut hasher, chain.modifications.as_deref());
        feed(&mut hasher, match chain.msa_option {
            foldprep_sheet::MsaOption::Auto   => "auto",
            foldprep_sheet::MsaOption::None   => "none",
            foldprep_sheet::MsaOption::Upload => "upload",
        });
        feed_opt(&mut hasher, chain.unpaired_msa.as_deref());
        feed_opt(&mut hasher, chain.paired_msa.as_deref());
        feed_opt(&mut hasher, chain.templates.as_deref());
        feed_opt(&mut hasher, chain.ccd_codes.as_ref().map(|c| c.join(",")).as_deref());
        feed_opt(&mut hasher, chain.smiles.as_deref());
        feed(&mut hasher, &join_seeds(&chain.seeds));
        feed_opt(&mut hasher, chain.bonded_atom_pairs.as_deref());
        feed_opt(&mut hasher, chain.user_ccd.as_deref());
    }
    hasher.finalize().into()
}

fn feed(hasher: &mut Sha256, value: &str) {
    hasher.update(1u8.to_le_bytes());
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn feed_opt(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => feed(hasher, v),
        None => hasher.update(0u8.to_le_bytes()),
    }
}

fn join_seeds(seeds: &[i64]) -> String {
    seeds
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// One signature per job, one pass: keep the first-encountered job of every
/// signature and drop the rest.
pub fn dedup_jobs(table: ExpandedTable) -> (ExpandedTable, DuplicateReport) {
    let jobs = table.jobs();
    let total_jobs = jobs.len();

    let mut by_signature: HashMap<[u8; 32], usize> = HashMap::new();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut kept: std::collections::HashSet<String> = std::collections::HashSet::new();

    for (name, chains) in &jobs {
        let sig = job_signature(chains);
        match by_signature.get(&sig) {
            Some(&idx) => groups[idx].removed.push((*name).to_string()),
            None => {
                by_signature.insert(sig, groups.len());
                groups.push(DuplicateGroup { kept: (*name).to_string(), removed: Vec::new() });
                kept.insert((*name).to_string());
            }
        }
    }

    let report = DuplicateReport { total_jobs, unique_jobs: kept.len(), groups };

    if report.duplicate_jobs() > 0 {
        warn!(
            total = report.total_jobs,
            unique = report.unique_jobs,
            removed = report.duplicate_jobs(),
            "Duplicate jobs collapsed"
        );
    } else {
        debug!(total = report.total_jobs, "No duplicate jobs found");
    }

    let records = table
        .records
        .into_iter()
        .filter(|r| kept.contains(&r.job_name))
        .collect();
    (ExpandedTable::new(records), report)
}

// ── Summary report ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DuplicateSummary {
    total_jobs: usize,
    unique_jobs: usize,
    duplicate_jobs: usize,
    duplicate_groups: usize,
    group_size_distribution: BTreeMap<usize, usize>,
    largest_groups: Vec<LargestGroup>,
    sample_duplicates: Vec<SampleGroup>,
}

#[derive(Debug, Serialize)]
struct LargestGroup {
    kept: String,
    num_duplicates: usize,
    sample_duplicates: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SampleGroup {
    kept: String,
    removed: Vec<String>,
}

/// Write `duplicate_job_summary.json`; above 100 removed jobs, also write
/// the full kept→removed mapping as a gzip-compressed TSV next to it.
pub fn write_duplicate_report(
    report: &DuplicateReport,
    summary_path: &Path,
    full_mapping_path: &Path,
) -> Result<()> {
    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for group in report.duplicate_groups() {
        *distribution.entry(group.removed.len() + 1).or_default() += 1;
    }

    let mut largest: Vec<&DuplicateGroup> = report.duplicate_groups().collect();
    largest.sort_by(|a, b| b.removed.len().cmp(&a.removed.len()));

    let summary = DuplicateSummary {
        total_jobs: report.total_jobs,
        unique_jobs: report.unique_jobs,
        duplicate_jobs: report.duplicate_jobs(),
        duplicate_groups: report.duplicate_groups().count(),
        group_size_distribution: distribution,
        largest_groups: largest
            .iter()
            .take(10)
            .map(|g| LargestGroup {
                kept: g.kept.clone(),
                num_duplicates: g.removed.len(),
                sample_duplicates: g.removed.iter().take(5).cloned().collect(),
            })
            .collect(),
        sample_duplicates: report
            .duplicate_groups()
            .take(10)
            .map(|g| SampleGroup { kept: g.kept.clone(), removed: g.removed.clone() })
            .collect(),
    };

    let file = std::fs::File::create(summary_path)?;
    serde_json::to_writer_pretty(file, &summary)?;

    if report.duplicate_jobs() > 100 {
        info!(path = %full_mapping_path.display(), "Writing full duplicate mapping");
        let file = std::fs::File::create(full_mapping_path)?;
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b"kept_job\tremoved_jobs\n")?;
        for group in report.duplicate_groups() {
            encoder.write_all(
                format!("{}\t{}\n", group.kept, group.removed.join(",")).as_bytes(),
            )?;
        }
        encoder.finish()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::from_rows;
    use foldprep_sheet::{parse_sample_sheet, Mode};
    use pretty_assertions::assert_eq;

    fn table(sheet: &str) -> ExpandedTable {
        from_rows(&parse_sample_sheet(sheet, Mode::Custom).unwrap(), None)
    }

    #[test]
    fn test_identical_content_collapses() {
        let sheet = "job_name,type,id,sequence\n\
                     p1,protein,A,MKT\n\
                     p2,protein,A,MKT\n";
        let (deduped, report) = dedup_jobs(table(sheet));
        assert_eq!(deduped.job_names(), vec!["p1"]);
        assert_eq!(report.total_jobs, 2);
        assert_eq!(report.unique_jobs, 1);
        assert_eq!(report.groups[0].removed, vec!["p2".to_string()]);
    }

    #[test]
    fn test_chain_order_is_irrelevant() {
        let sheet = "job_name,type,id,sequence\n\
                     p1,protein,A,MKT\n\
                     p1,protein,B,GGG\n\
                     p2,protein,B,GGG\n\
                     p2,protein,A,MKT\n";
        let (deduped, report) = dedup_jobs(table(sheet));
        assert_eq!(deduped.job_names(), vec!["p1"]);
        assert_eq!(report.duplicate_jobs(), 1);
    }

    #[test]
    fn test_different_sequences_kept() {
        let sheet = "job_name,type,id,sequence\n\
                     p1,protein,A,MKT\n\
                     p2,protein,A,MKV\n";
        let (deduped, report) = dedup_jobs(table(sheet));
        assert_eq!(deduped.job_names(), vec!["p1", "p2"]);
        assert_eq!(report.duplicate_jobs(), 0);
    }

    #[test]
    fn test_differing_msa_option_is_content() {
        let sheet = "job_name,type,id,sequence,msa_option\n\
                     p1,protein,A,MKT,auto\n\
                     p2,protein,A,MKT,none\n";
        let (deduped, _) = dedup_jobs(table(sheet));
        assert_eq!(deduped.job_names().len(), 2);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let sheet = "job_name,type,id,sequence\n\
                     p1,protein,A,MKT\n\
                     p1,rna,B,GGAU\n";
        let t = table(sheet);
        let jobs = t.jobs();
        assert_eq!(job_signature(&jobs[0].1), job_signature(&jobs[0].1));
    }

    #[test]
    fn test_summary_written() {
        let sheet = "job_name,type,id,sequence\n\
                     p1,protein,A,MKT\n\
                     p2,protein,A,MKT\n\
                     p3,protein,A,MKT\n";
        let (_, report) = dedup_jobs(table(sheet));
        let dir = tempfile::tempdir().unwrap();
        let summary_path = dir.path().join("duplicate_job_summary.json");
        let mapping_path = dir.path().join("mapping.txt.gz");
        write_duplicate_report(&report, &summary_path, &mapping_path).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
        assert_eq!(summary["total_jobs"], 3);
        assert_eq!(summary["unique_jobs"], 1);
        assert_eq!(summary["duplicate_jobs"], 2);
        assert_eq!(summary["group_size_distribution"]["3"], 1);
        assert_eq!(summary["largest_groups"][0]["kept"], "p1");
        // Small duplicate sets do not get the gzip mapping.
        assert!(!mapping_path.exists());
    }
}
