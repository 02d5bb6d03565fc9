//! Sequence-level canonicalization of monomer artifacts.
//!
//! If five different multimers each contain a chain with identical sequence,
//! only one monomer precomputation is scheduled; all five reference that
//! single artifact. The canonical artifact for a sequence is the
//! lexicographically smallest candidate path, which is stable across runs.

use std::collections::HashMap;

use foldprep_common::{FoldprepError, Result, RunLayout};

use crate::decompose::MonomerUnit;

/// The one artifact chosen to represent every chain sharing a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalArtifact {
    pub job_name: String,
    /// Artifact path as written into the manifests.
    pub artifact: String,
    pub seeds: Vec<i64>,
    /// Polymer chain id inside the canonical task file.
    pub chain_id: String,
}

/// Sequence → canonical artifact mapping.
#[derive(Debug, Default)]
pub struct CanonicalMonomers {
    by_sequence: HashMap<String, CanonicalArtifact>,
}

impl CanonicalMonomers {
    /// Canonical artifact for a sequence; a miss is a hard error because
    /// inference files would reference a nonexistent precomputation.
    pub fn artifact_for(&self, sequence: &str) -> Result<&CanonicalArtifact> {
        self.by_sequence.get(sequence).ok_or_else(|| {
            let head: String = sequence.chars().take(12).collect();
            FoldprepError::Dependency(format!(
                "no canonical monomer artifact for sequence '{head}…'"
            ))
        })
    }

    /// Canonical artifacts, sorted by artifact path.
    pub fn canonical_jobs(&self) -> Vec<&CanonicalArtifact> {
        let mut jobs: Vec<&CanonicalArtifact> = self.by_sequence.values().collect();
        jobs.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        jobs.dedup_by(|a, b| a.artifact == b.artifact);
        jobs
    }

    pub fn len(&self) -> usize {
        self.by_sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_sequence.is_empty()
    }
}

/// Pick one canonical artifact per distinct sequence among the candidates.
pub fn canonicalize(units: &[MonomerUnit], layout: &RunLayout) -> CanonicalMonomers {
    let mut by_sequence: HashMap<String, CanonicalArtifact> = HashMap::new();

    for unit in units {
        let artifact = layout
            .monomer_artifact(&unit.job_name)
            .to_string_lossy()
            .into_owned();
        let candidate = CanonicalArtifact {
            job_name: unit.job_name.clone(),
            artifact,
            seeds: unit.seeds.clone(),
            chain_id: unit.chain_id.clone(),
        };
        by_sequence
            .entry(unit.sequence.clone())
            .and_modify(|current| {
                if candidate.artifact < current.artifact {
                    *current = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    CanonicalMonomers { by_sequence }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit(job: &str, chain: &str, seq: &str) -> MonomerUnit {
        MonomerUnit {
            job_name: job.to_string(),
            chain_id: chain.to_string(),
            sequence: seq.to_string(),
            seeds: vec![1],
            derived_from: None,
        }
    }

    #[test]
    fn test_identical_sequences_share_one_artifact() {
        let layout = RunLayout::new("out");
        let units = vec![
            unit("dimer_chain-a", "A", "MKT"),
            unit("dimer_chain-b", "B", "MKT"),
        ];
        let canon = canonicalize(&units, &layout);
        assert_eq!(canon.len(), 1);
        let artifact = canon.artifact_for("MKT").unwrap();
        assert_eq!(artifact.job_name, "dimer_chain-a");
    }

    #[test]
    fn test_lexicographically_smallest_path_wins() {
        let layout = RunLayout::new("out");
        let units = vec![
            unit("z_chain-a", "A", "MKT"),
            unit("a_chain-a", "A", "MKT"),
            unit("m_chain-a", "A", "MKT"),
        ];
        let canon = canonicalize(&units, &layout);
        assert_eq!(canon.artifact_for("MKT").unwrap().job_name, "a_chain-a");
    }

    #[test]
    fn test_standalone_job_beats_derived_chain() {
        let layout = RunLayout::new("out");
        let units = vec![
            MonomerUnit { derived_from: Some("p1_p1".to_string()), ..unit("p1_p1_chain-a", "A", "MKT") },
            unit("p1", "a", "MKT"),
        ];
        let canon = canonicalize(&units, &layout);
        // "out/rule_AF3_DATA_PIPELINE/p1/…" < "out/rule_AF3_DATA_PIPELINE/p1_p1_chain-a/…"
        assert_eq!(canon.artifact_for("MKT").unwrap().job_name, "p1");
    }

    #[test]
    fn test_distinct_sequences_distinct_artifacts() {
        let layout = RunLayout::new("out");
        let units = vec![unit("a", "A", "MKT"), unit("b", "A", "GGG")];
        let canon = canonicalize(&units, &layout);
        assert_eq!(canon.len(), 2);
        assert!(canon.artifact_for("ACGT").is_err());
    }

    #[test]
    fn test_canonical_jobs_sorted() {
        let layout = RunLayout::new("out");
        let units = vec![unit("b", "A", "GGG"), unit("a", "A", "MKT")];
        let canon = canonicalize(&units, &layout);
        let jobs: Vec<&str> = canon.canonical_jobs().iter().map(|c| c.job_name.as_str()).collect();
        assert_eq!(jobs, vec!["a", "b"]);
    }
}
