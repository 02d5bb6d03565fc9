//! Write task files into the monomer / multimer output areas.

use std::fs;
use std::path::Path;

use foldprep_common::{Result, RunLayout};
use foldprep_expand::table::is_multimer;
use foldprep_expand::ExpandedTable;
use tracing::{debug, info};

use crate::builder::build_task;
use crate::descriptor::TaskDescriptor;

/// Counts of files written by one pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskWriteSummary {
    pub monomer_files: usize,
    pub multimer_files: usize,
}

/// Serialize every job of the table.
///
/// Multimer jobs are written once per seed (`{job}_seed-{s}.json`, task name
/// suffixed to match, `modelSeeds` reduced to that seed). Monomer jobs get a
/// single file carrying the full seed list.
pub fn write_job_tasks(table: &ExpandedTable, layout: &RunLayout) -> Result<TaskWriteSummary> {
    let mut summary = TaskWriteSummary::default();

    for (name, chains) in table.jobs() {
        let task = build_task(name, &chains)?;

        if is_multimer(&chains) {
            fs::create_dir_all(layout.multimer_task_dir())?;
            for &seed in &task.model_seeds {
                let mut per_seed = task.clone();
                per_seed.name = format!("{name}_seed-{seed}");
                per_seed.model_seeds = vec![seed];
                write_pretty(&per_seed, &layout.multimer_task(name, seed))?;
                summary.multimer_files += 1;
            }
        } else {
            fs::create_dir_all(layout.monomer_task_dir())?;
            write_pretty(&task, &layout.monomer_task(name))?;
            summary.monomer_files += 1;
        }
        debug!(job = name, "Task serialized");
    }

    info!(
        monomer_files = summary.monomer_files,
        multimer_files = summary.multimer_files,
        "Task files written"
    );
    Ok(summary)
}

fn write_pretty(task: &TaskDescriptor, path: &Path) -> Result<()> {
    let file = fs::File::create(path)?;
    serde_json::to_writer_pretty(file, task)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldprep_expand::table::from_rows;
    use foldprep_sheet::{parse_sample_sheet, Mode};
    use pretty_assertions::assert_eq;

    fn write(sheet: &str) -> (tempfile::TempDir, RunLayout, TaskWriteSummary) {
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path());
        let summary = write_job_tasks(&table, &layout).unwrap();
        (dir, layout, summary)
    }

    #[test]
    fn test_multimer_fans_out_per_seed() {
        let sheet = "job_name,type,id,sequence,model_seeds\n\
                     dimer,protein,A,MKT,\"1,2,3\"\n\
                     dimer,protein,B,GGG,\n";
        let (_dir, layout, summary) = write(sheet);
        assert_eq!(summary.multimer_files, 3);

        for seed in 1..=3 {
            let path = layout.multimer_task("dimer", seed);
            let task: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(task["name"], format!("dimer_seed-{seed}"));
            assert_eq!(task["modelSeeds"], serde_json::json!([seed]));
        }
    }

    #[test]
    fn test_monomer_single_file_full_seed_list() {
        let sheet = "job_name,type,id,sequence,model_seeds\n\
                     mono,protein,A,MKT,\"1,2,3\"\n";
        let (_dir, layout, summary) = write(sheet);
        assert_eq!(summary.monomer_files, 1);

        let task: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(layout.monomer_task("mono")).unwrap(),
        )
        .unwrap();
        assert_eq!(task["name"], "mono");
        assert_eq!(task["modelSeeds"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_ligand_only_job_lands_in_monomer_area() {
        let sheet = "job_name,type,id,sequence\ncomplex,protein,A,MKT\ncomplex,ligand,B,ATP\n";
        let (_dir, layout, summary) = write(sheet);
        assert_eq!(summary.monomer_files, 1);
        assert!(layout.monomer_task("complex").exists());
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let sheet = "job_name,type,id,sequence\nj,protein,A,MKT\nj,rna,B,GGAU\n";
        let rows = parse_sample_sheet(sheet, Mode::Custom).unwrap();
        let table = from_rows(&rows, None);

        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        write_job_tasks(&table, &RunLayout::new(dir_a.path())).unwrap();
        write_job_tasks(&table, &RunLayout::new(dir_b.path())).unwrap();

        let a = std::fs::read(RunLayout::new(dir_a.path()).multimer_task("j", 1)).unwrap();
        let b = std::fs::read(RunLayout::new(dir_b.path()).multimer_task("j", 1)).unwrap();
        assert_eq!(a, b);
    }
}
