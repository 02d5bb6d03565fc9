//! Central path-layout policy for a preprocessing run.
//!
//! The downstream batch scheduler finds every input and expected output
//! through the paths written into the manifests, so path derivation must be
//! exact and stable. All of it lives here as pure functions of
//! {job kind, job name, seed, sample}; no other crate builds output paths by
//! string editing.

use std::path::{Path, PathBuf};

/// Stage directory holding generated task files and metadata.
pub const PREPROCESSING_DIR: &str = "rule_PREPROCESSING";

/// Stage directory where the external data pipeline deposits per-chain
/// artifacts (MSAs, templates).
pub const DATA_PIPELINE_DIR: &str = "rule_AF3_DATA_PIPELINE";

/// Stage directory where precomputed monomer data is merged back into
/// multimer tasks before inference.
pub const MERGE_DIR: &str = "rule_MERGE_MONOMERS_TO_MULTIMERS";

/// Stage directory where the inference engine writes predictions.
pub const INFERENCE_DIR: &str = "rule_AF3_INFERENCE";

/// Path policy rooted at the run output directory.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── Task files ────────────────────────────────────────────────────────

    /// Directory of single-polymer task files (data-pipeline inputs).
    pub fn monomer_task_dir(&self) -> PathBuf {
        self.root.join(PREPROCESSING_DIR).join("monomers")
    }

    /// Task file for a monomer job; carries the full seed list.
    pub fn monomer_task(&self, job: &str) -> PathBuf {
        self.monomer_task_dir().join(format!("{job}.json"))
    }

    /// Directory of multi-polymer task files (one per seed).
    pub fn multimer_task_dir(&self) -> PathBuf {
        self.root.join(PREPROCESSING_DIR).join("multimers")
    }

    /// Per-seed task file for a multimer job.
    pub fn multimer_task(&self, job: &str, seed: i64) -> PathBuf {
        self.multimer_task_dir().join(format!("{job}_seed-{seed}.json"))
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(PREPROCESSING_DIR).join("metadata")
    }

    pub fn duplicate_summary(&self) -> PathBuf {
        self.metadata_dir().join("duplicate_job_summary.json")
    }

    /// Gzip-compressed kept→removed mapping, written only for large
    /// duplicate sets.
    pub fn duplicate_full_mapping(&self) -> PathBuf {
        self.metadata_dir().join("duplicate_job_summary_full_mapping.txt.gz")
    }

    pub fn stoichiometry_summary(&self) -> PathBuf {
        self.metadata_dir().join("stoichio_screen.csv")
    }

    pub fn data_pipeline_manifest(&self) -> PathBuf {
        self.metadata_dir().join("data_pipeline_samples.tsv")
    }

    pub fn dependency_map_manifest(&self) -> PathBuf {
        self.metadata_dir().join("inference_to_data_pipeline_map.tsv")
    }

    pub fn inference_manifest(&self) -> PathBuf {
        self.metadata_dir().join("inference_samples.tsv")
    }

    // ── External stage outputs ────────────────────────────────────────────

    /// Precomputed artifact for one monomer job. The data pipeline writes
    /// into a per-job subdirectory.
    pub fn monomer_artifact(&self, job: &str) -> PathBuf {
        self.root
            .join(DATA_PIPELINE_DIR)
            .join(job)
            .join(format!("{job}_data.json"))
    }

    /// Inference input for one (multimer job, seed) after monomer data has
    /// been merged in.
    pub fn merged_multimer_input(&self, job: &str, seed: i64) -> PathBuf {
        self.root.join(MERGE_DIR).join(format!("{job}_seed-{seed}_data.json"))
    }

    /// Inference input for a monomer job (runs with no multimers at all);
    /// the single file carries the full seed list.
    pub fn merged_monomer_input(&self, job: &str) -> PathBuf {
        self.root.join(MERGE_DIR).join(format!("{job}_data.json"))
    }

    /// Expected prediction for one (inference unit, seed, sample).
    pub fn predicted_structure(&self, name: &str, seed: i64, sample: u32) -> PathBuf {
        self.root
            .join(INFERENCE_DIR)
            .join(name)
            .join(format!("seed-{seed}_sample-{sample}"))
            .join("model.cif")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> RunLayout {
        RunLayout::new("out")
    }

    #[test]
    fn test_monomer_task_path() {
        assert_eq!(
            layout().monomer_task("p1_chain-a"),
            PathBuf::from("out/rule_PREPROCESSING/monomers/p1_chain-a.json")
        );
    }

    #[test]
    fn test_multimer_task_path() {
        assert_eq!(
            layout().multimer_task("p1_p2", 3),
            PathBuf::from("out/rule_PREPROCESSING/multimers/p1_p2_seed-3.json")
        );
    }

    #[test]
    fn test_monomer_artifact_has_job_subdir() {
        assert_eq!(
            layout().monomer_artifact("p1_chain-a"),
            PathBuf::from("out/rule_AF3_DATA_PIPELINE/p1_chain-a/p1_chain-a_data.json")
        );
    }

    #[test]
    fn test_merged_inputs() {
        assert_eq!(
            layout().merged_multimer_input("p1_p2", 2),
            PathBuf::from("out/rule_MERGE_MONOMERS_TO_MULTIMERS/p1_p2_seed-2_data.json")
        );
        assert_eq!(
            layout().merged_monomer_input("p1"),
            PathBuf::from("out/rule_MERGE_MONOMERS_TO_MULTIMERS/p1_data.json")
        );
    }

    #[test]
    fn test_predicted_structure_path() {
        assert_eq!(
            layout().predicted_structure("p1_p2_seed-2", 2, 4),
            PathBuf::from("out/rule_AF3_INFERENCE/p1_p2_seed-2/seed-2_sample-4/model.cif")
        );
    }

    #[test]
    fn test_metadata_paths() {
        let l = layout();
        assert_eq!(
            l.duplicate_summary(),
            PathBuf::from("out/rule_PREPROCESSING/metadata/duplicate_job_summary.json")
        );
        assert_eq!(
            l.inference_manifest(),
            PathBuf::from("out/rule_PREPROCESSING/metadata/inference_samples.tsv")
        );
    }
}
