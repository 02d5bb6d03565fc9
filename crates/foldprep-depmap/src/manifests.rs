//! Build and write the three scheduler manifests, plus garbage collection
//! of monomer task files nothing references.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use foldprep_common::{Result, RunLayout};
use foldprep_expand::table::is_multimer;
use foldprep_expand::ExpandedTable;
use tracing::{debug, info};

use crate::canonical::CanonicalMonomers;
use crate::decompose::Decomposition;

/// One dependency edge: this inference input needs that precomputed
/// artifact merged in for that chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEdge {
    pub multimer_file: String,
    pub monomer_chain_id: String,
    pub monomer_file: String,
    pub sample_id: String,
}

/// One monomer precomputation the external data pipeline must run.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPipelineRow {
    pub file: String,
    pub sample_id: String,
    pub expected_output: String,
}

/// One inference invocation with its expected result location.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRow {
    pub sample_id: String,
    pub file: String,
    pub expected_output: String,
    // Numeric sort keys; not written to the manifest.
    seed: i64,
    sample: u32,
}

#[derive(Debug, Default)]
pub struct Manifests {
    pub edges: Vec<DependencyEdge>,
    pub data_pipeline: Vec<DataPipelineRow>,
    pub inference: Vec<InferenceRow>,
    /// Monomer task files some mapping references; everything else in the
    /// monomer area is garbage.
    pub referenced_tasks: HashSet<PathBuf>,
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Correlate the deduplicated table with its decomposition and produce all
/// manifest rows, sorted so re-runs are byte-identical.
pub fn build_manifests(
    table: &ExpandedTable,
    decomp: &Decomposition,
    canon: &CanonicalMonomers,
    layout: &RunLayout,
    n_samples: u32,
    predict_individual_components: bool,
) -> Result<Manifests> {
    let mut manifests = Manifests::default();

    if decomp.has_multimers {
        build_multimer_manifests(table, canon, layout, n_samples, &mut manifests)?;
        if predict_individual_components {
            add_individual_components(canon, layout, n_samples, &mut manifests);
        }
    } else {
        build_monomer_only_manifests(decomp, layout, n_samples, &mut manifests);
    }

    manifests
        .edges
        .sort_by(|a, b| (&a.multimer_file, &a.monomer_chain_id).cmp(&(&b.multimer_file, &b.monomer_chain_id)));
    manifests.data_pipeline.sort_by(|a, b| a.file.cmp(&b.file));
    manifests.data_pipeline.dedup();
    manifests
        .inference
        .sort_by(|a, b| (&a.sample_id, a.seed, a.sample).cmp(&(&b.sample_id, b.seed, b.sample)));

    info!(
        edges = manifests.edges.len(),
        precomputations = manifests.data_pipeline.len(),
        inference_rows = manifests.inference.len(),
        "Dependency manifests built"
    );
    Ok(manifests)
}

fn build_multimer_manifests(
    table: &ExpandedTable,
    canon: &CanonicalMonomers,
    layout: &RunLayout,
    n_samples: u32,
    manifests: &mut Manifests,
) -> Result<()> {
    for (job, chains) in table.jobs() {
        if !is_multimer(&chains) {
            continue;
        }
        let seeds = chains[0].seeds.clone();
        for &seed in &seeds {
            let multimer_file = path_str(&layout.multimer_task(job, seed));
            let sample_id = format!("{job}_seed-{seed}");

            for chain in chains.iter().filter(|c| c.kind.is_polymer()) {
                let canonical = canon.artifact_for(&chain.sequence)?;
                manifests.edges.push(DependencyEdge {
                    multimer_file: multimer_file.clone(),
                    monomer_chain_id: chain.id.clone(),
                    monomer_file: canonical.artifact.clone(),
                    sample_id: sample_id.clone(),
                });
            }

            let file = path_str(&layout.merged_multimer_input(job, seed));
            for sample in 1..=n_samples {
                manifests.inference.push(InferenceRow {
                    sample_id: sample_id.clone(),
                    file: file.clone(),
                    expected_output: path_str(&layout.predicted_structure(&sample_id, seed, sample)),
                    seed,
                    sample,
                });
            }
        }
    }

    for canonical in canon.canonical_jobs() {
        let task = layout.monomer_task(&canonical.job_name);
        manifests.data_pipeline.push(DataPipelineRow {
            file: path_str(&task),
            sample_id: canonical.job_name.clone(),
            expected_output: canonical.artifact.clone(),
        });
        manifests.referenced_tasks.insert(task);
    }
    Ok(())
}

/// Schedule the canonical monomer components themselves for inference,
/// alongside the multimers they feed.
fn add_individual_components(
    canon: &CanonicalMonomers,
    layout: &RunLayout,
    n_samples: u32,
    manifests: &mut Manifests,
) {
    for canonical in canon.canonical_jobs() {
        manifests.edges.push(DependencyEdge {
            multimer_file: canonical.artifact.clone(),
            monomer_chain_id: canonical.chain_id.clone(),
            monomer_file: canonical.artifact.clone(),
            sample_id: canonical.job_name.clone(),
        });

        let file = path_str(&layout.merged_monomer_input(&canonical.job_name));
        for &seed in &canonical.seeds {
            for sample in 1..=n_samples {
                manifests.inference.push(InferenceRow {
                    sample_id: canonical.job_name.clone(),
                    file: file.clone(),
                    expected_output: path_str(&layout.predicted_structure(
                        &canonical.job_name,
                        seed,
                        sample,
                    )),
                    seed,
                    sample,
                });
            }
        }
    }
}

/// Runs with no multimers: every monomer job maps to its own artifact and
/// is inferred directly, so nothing is garbage.
fn build_monomer_only_manifests(
    decomp: &Decomposition,
    layout: &RunLayout,
    n_samples: u32,
    manifests: &mut Manifests,
) {
    for unit in &decomp.units {
        let artifact = path_str(&layout.monomer_artifact(&unit.job_name));
        let task = layout.monomer_task(&unit.job_name);

        manifests.edges.push(DependencyEdge {
            multimer_file: artifact.clone(),
            monomer_chain_id: unit.chain_id.clone(),
            monomer_file: artifact.clone(),
            sample_id: unit.job_name.clone(),
        });
        manifests.data_pipeline.push(DataPipelineRow {
            file: path_str(&task),
            sample_id: unit.job_name.clone(),
            expected_output: artifact.clone(),
        });
        manifests.referenced_tasks.insert(task);

        let file = path_str(&layout.merged_monomer_input(&unit.job_name));
        for &seed in &unit.seeds {
            for sample in 1..=n_samples {
                manifests.inference.push(InferenceRow {
                    sample_id: unit.job_name.clone(),
                    file: file.clone(),
                    expected_output: path_str(&layout.predicted_structure(
                        &unit.job_name,
                        seed,
                        sample,
                    )),
                    seed,
                    sample,
                });
            }
        }
    }
}

/// Write the three TSV manifests into the metadata area.
pub fn write_manifests(manifests: &Manifests, layout: &RunLayout) -> Result<()> {
    std::fs::create_dir_all(layout.metadata_dir())?;

    let mut writer = tsv_writer(&layout.data_pipeline_manifest())?;
    writer.write_record(["file", "sample_id", "expected_output"])?;
    for row in &manifests.data_pipeline {
        writer.write_record([&row.file, &row.sample_id, &row.expected_output])?;
    }
    writer.flush()?;

    let mut writer = tsv_writer(&layout.dependency_map_manifest())?;
    writer.write_record(["multimer_file", "monomer_chain_id", "monomer_file", "sample_id"])?;
    for edge in &manifests.edges {
        writer.write_record([
            &edge.multimer_file,
            &edge.monomer_chain_id,
            &edge.monomer_file,
            &edge.sample_id,
        ])?;
    }
    writer.flush()?;

    let mut writer = tsv_writer(&layout.inference_manifest())?;
    writer.write_record(["sample_id", "file", "expected_output"])?;
    for row in &manifests.inference {
        writer.write_record([&row.sample_id, &row.file, &row.expected_output])?;
    }
    writer.flush()?;

    Ok(())
}

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

/// Delete monomer task files whose artifact no dependency-map entry
/// references. Returns how many files were removed.
pub fn collect_garbage(manifests: &Manifests, layout: &RunLayout) -> Result<usize> {
    let dir = layout.monomer_task_dir();
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if !manifests.referenced_tasks.contains(&path) {
            info!(path = %path.display(), "Deleting redundant fold input");
            std::fs::remove_file(&path)?;
            removed += 1;
        } else {
            debug!(path = %path.display(), "Fold input referenced, kept");
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalize;
    use crate::decompose::decompose;
    use foldprep_expand::table::from_rows;
    use foldprep_sheet::{parse_sample_sheet, Mode};
    use pretty_assertions::assert_eq;

    fn build(sheet: &str, n_samples: u32) -> (RunLayout, Manifests) {
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let decomp = decompose(&table);
        let layout = RunLayout::new("out");
        let canon = canonicalize(&decomp.units, &layout);
        let manifests =
            build_manifests(&table, &decomp, &canon, &layout, n_samples, false).unwrap();
        (layout, manifests)
    }

    #[test]
    fn test_shared_chain_precomputed_once() {
        let sheet = "job_name,type,id,sequence\n\
                     d1,protein,A,MKT\n\
                     d1,protein,B,GGG\n\
                     d2,protein,A,MKT\n\
                     d2,protein,B,CCC\n";
        let (_, manifests) = build(sheet, 1);

        // MKT appears in both dimers but is scheduled once.
        let mkt_rows: Vec<&DataPipelineRow> = manifests
            .data_pipeline
            .iter()
            .filter(|r| r.sample_id.contains("chain-a"))
            .collect();
        assert_eq!(mkt_rows.len(), 1);
        assert_eq!(mkt_rows[0].sample_id, "d1_chain-a");

        // Both multimers reference the same canonical artifact for chain A.
        let a_edges: Vec<&DependencyEdge> = manifests
            .edges
            .iter()
            .filter(|e| e.monomer_chain_id == "a")
            .collect();
        assert_eq!(a_edges.len(), 2);
        assert_eq!(a_edges[0].monomer_file, a_edges[1].monomer_file);
    }

    #[test]
    fn test_edges_expand_per_seed() {
        let sheet = "job_name,type,id,sequence,model_seeds\n\
                     d1,protein,A,MKT,\"1,2\"\n\
                     d1,protein,B,GGG,\n";
        let (_, manifests) = build(sheet, 1);
        let sample_ids: Vec<&str> =
            manifests.edges.iter().map(|e| e.sample_id.as_str()).collect();
        assert!(sample_ids.contains(&"d1_seed-1"));
        assert!(sample_ids.contains(&"d1_seed-2"));
        assert_eq!(manifests.edges.len(), 4);
    }

    #[test]
    fn test_inference_rows_fan_out_per_seed_and_sample() {
        let sheet = "job_name,type,id,sequence,model_seeds\n\
                     d1,protein,A,MKT,\"1,2\"\n\
                     d1,protein,B,GGG,\n";
        let (_, manifests) = build(sheet, 3);
        assert_eq!(manifests.inference.len(), 6);
        assert_eq!(manifests.inference[0].sample_id, "d1_seed-1");
        assert_eq!(
            manifests.inference[0].expected_output,
            "out/rule_AF3_INFERENCE/d1_seed-1/seed-1_sample-1/model.cif"
        );
        assert_eq!(
            manifests.inference[5].expected_output,
            "out/rule_AF3_INFERENCE/d1_seed-2/seed-2_sample-3/model.cif"
        );
    }

    #[test]
    fn test_monomer_only_run_self_maps() {
        let sheet = "job_name,type,id,sequence\n\
                     m1,protein,A,MKT\n";
        let (_, manifests) = build(sheet, 2);
        assert_eq!(manifests.edges.len(), 1);
        assert_eq!(manifests.edges[0].multimer_file, manifests.edges[0].monomer_file);
        assert_eq!(manifests.edges[0].sample_id, "m1");
        assert_eq!(manifests.inference.len(), 2);
        assert_eq!(
            manifests.inference[0].file,
            "out/rule_MERGE_MONOMERS_TO_MULTIMERS/m1_data.json"
        );
    }

    #[test]
    fn test_dependency_miss_is_hard_error() {
        let sheet = "job_name,type,id,sequence\n\
                     d1,protein,A,MKT\n\
                     d1,protein,B,GGG\n";
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let decomp = decompose(&table);
        let layout = RunLayout::new("out");
        // Canonical map built from no candidates: every lookup must fail.
        let canon = canonicalize(&[], &layout);
        let err = build_manifests(&table, &decomp, &canon, &layout, 1, false).unwrap_err();
        assert!(err.to_string().contains("canonical monomer artifact"));
    }

    #[test]
    fn test_individual_components_supplement() {
        let sheet = "job_name,type,id,sequence\n\
                     d1,protein,A,MKT\n\
                     d1,protein,B,GGG\n";
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let decomp = decompose(&table);
        let layout = RunLayout::new("out");
        let canon = canonicalize(&decomp.units, &layout);
        let manifests = build_manifests(&table, &decomp, &canon, &layout, 1, true).unwrap();

        // 1 multimer row + 2 component rows.
        assert_eq!(manifests.inference.len(), 3);
        assert!(manifests
            .inference
            .iter()
            .any(|r| r.sample_id == "d1_chain-a"));
        // Self-edges for both components.
        assert_eq!(manifests.edges.len(), 4);
    }

    #[test]
    fn test_manifests_written_with_headers() {
        let sheet = "job_name,type,id,sequence\n\
                     d1,protein,A,MKT\n\
                     d1,protein,B,GGG\n";
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let decomp = decompose(&table);
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path());
        let canon = canonicalize(&decomp.units, &layout);
        let manifests = build_manifests(&table, &decomp, &canon, &layout, 1, false).unwrap();
        write_manifests(&manifests, &layout).unwrap();

        let map = std::fs::read_to_string(layout.dependency_map_manifest()).unwrap();
        assert!(map.starts_with("multimer_file\tmonomer_chain_id\tmonomer_file\tsample_id\n"));
        let samples = std::fs::read_to_string(layout.inference_manifest()).unwrap();
        assert!(samples.starts_with("sample_id\tfile\texpected_output\n"));
    }

    #[test]
    fn test_garbage_collection_removes_unreferenced() {
        let sheet = "job_name,type,id,sequence\n\
                     d1,protein,A,MKT\n\
                     d1,protein,B,MKT\n";
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let decomp = decompose(&table);
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path());

        // Both derived chains share a sequence, so only one task survives.
        foldprep_tasks::write_job_tasks(&decomp.derived_table, &layout).unwrap();
        assert!(layout.monomer_task("d1_chain-a").exists());
        assert!(layout.monomer_task("d1_chain-b").exists());

        let canon = canonicalize(&decomp.units, &layout);
        let manifests = build_manifests(&table, &decomp, &canon, &layout, 1, false).unwrap();
        let removed = collect_garbage(&manifests, &layout).unwrap();
        assert_eq!(removed, 1);
        assert!(layout.monomer_task("d1_chain-a").exists());
        assert!(!layout.monomer_task("d1_chain-b").exists());
    }
}
