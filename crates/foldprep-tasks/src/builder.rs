//! Build a `TaskDescriptor` from one job's chain records.

use foldprep_common::{FoldprepError, Result};
use foldprep_expand::ChainRecord;
use foldprep_sheet::{EntityKind, MsaOption};
use serde_json::Value;
use tracing::warn;

use crate::descriptor::{
    DnaEntry, LigandEntry, ProteinEntry, RnaEntry, SequenceEntry, TaskDescriptor, DIALECT,
    VERSION,
};

/// Serialize one job. Chains keep their table order; job-level parameters
/// (seeds, bonded-atom pairs, user CCD) take the first non-null value across
/// the job's rows.
pub fn build_task(job_name: &str, chains: &[&ChainRecord]) -> Result<TaskDescriptor> {
    let model_seeds = chains
        .iter()
        .map(|c| c.seeds.clone())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| vec![1]);

    let bonded_atom_pairs = chains
        .iter()
        .find_map(|c| parse_json_field(c.bonded_atom_pairs.as_deref(), "bonded_atom_pairs", job_name));
    let user_ccd = chains.iter().find_map(|c| c.user_ccd.clone());

    let sequences = chains
        .iter()
        .map(|chain| build_entry(chain, job_name))
        .collect::<Result<Vec<_>>>()?;

    Ok(TaskDescriptor {
        name: job_name.to_string(),
        model_seeds,
        sequences,
        dialect: DIALECT.to_string(),
        version: VERSION,
        bonded_atom_pairs,
        user_ccd,
    })
}

fn build_entry(chain: &ChainRecord, job_name: &str) -> Result<SequenceEntry> {
    let modifications = parse_json_field(chain.modifications.as_deref(), "modifications", job_name);
    let templates = parse_json_field(chain.templates.as_deref(), "templates", job_name);

    let entry = match chain.kind {
        EntityKind::Protein => {
            let mut entry = ProteinEntry {
                id: chain.id.clone(),
                sequence: chain.sequence.clone(),
                modifications,
                ..Default::default()
            };
            match chain.msa_option {
                // Engine computes both MSAs; templates only when supplied.
                MsaOption::Auto => entry.templates = templates,
                // MSA-free and template-free unless templates supplied.
                MsaOption::None => {
                    entry.unpaired_msa = Some(String::new());
                    entry.paired_msa = Some(String::new());
                    entry.templates = Some(templates.unwrap_or_else(|| Value::Array(Vec::new())));
                }
                MsaOption::Upload => {
                    entry.unpaired_msa_path =
                        Some(chain.unpaired_msa.clone().unwrap_or_default());
                    entry.paired_msa_path = Some(chain.paired_msa.clone().unwrap_or_default());
                    entry.templates = templates;
                }
            }
            SequenceEntry::Protein(entry)
        }
        EntityKind::Rna => {
            let unpaired_msa = match chain.msa_option {
                MsaOption::Auto   => None,
                MsaOption::None   => Some(String::new()),
                MsaOption::Upload => Some(chain.unpaired_msa.clone().unwrap_or_default()),
            };
            SequenceEntry::Rna(RnaEntry {
                id: chain.id.clone(),
                sequence: chain.sequence.clone(),
                modifications,
                unpaired_msa,
            })
        }
        EntityKind::Dna => SequenceEntry::Dna(DnaEntry {
            id: chain.id.clone(),
            sequence: chain.sequence.clone(),
            modifications,
        }),
        EntityKind::Ligand => {
            let has_ccd = chain.ccd_codes.as_ref().is_some_and(|c| !c.is_empty());
            if !has_ccd && chain.smiles.is_none() {
                return Err(FoldprepError::Validation(format!(
                    "ligand '{}' in job '{job_name}' has neither ccd_codes nor smiles",
                    chain.id
                )));
            }
            SequenceEntry::Ligand(LigandEntry {
                id: chain.id.clone(),
                ccd_codes: if has_ccd { chain.ccd_codes.clone() } else { None },
                smiles: if has_ccd { None } else { chain.smiles.clone() },
            })
        }
    };
    Ok(entry)
}

/// Parse a raw JSON column value. Malformed JSON is not fatal: the field is
/// treated as absent and the job proceeds.
fn parse_json_field(raw: Option<&str>, field: &str, job_name: &str) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(job = job_name, field, error = %e, "Malformed JSON field ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldprep_expand::table::from_rows;
    use foldprep_expand::ExpandedTable;
    use foldprep_sheet::{parse_sample_sheet, Mode};
    use pretty_assertions::assert_eq;

    fn table(sheet: &str) -> ExpandedTable {
        from_rows(&parse_sample_sheet(sheet, Mode::Custom).unwrap(), None)
    }

    fn task(sheet: &str) -> TaskDescriptor {
        let t = table(sheet);
        let jobs = t.jobs();
        build_task(jobs[0].0, &jobs[0].1).unwrap()
    }

    #[test]
    fn test_protein_auto_omits_msa_fields() {
        let json =
            serde_json::to_value(task("job_name,type,id,sequence\nj,protein,A,MKT\n")).unwrap();
        let protein = &json["sequences"][0]["protein"];
        assert!(protein.get("unpairedMsa").is_none());
        assert!(protein.get("pairedMsa").is_none());
        assert!(protein.get("templates").is_none());
    }

    #[test]
    fn test_protein_none_sets_empty_msa_and_templates() {
        let json = serde_json::to_value(task(
            "job_name,type,id,sequence,msa_option\nj,protein,A,MKT,none\n",
        ))
        .unwrap();
        let protein = &json["sequences"][0]["protein"];
        assert_eq!(protein["unpairedMsa"], "");
        assert_eq!(protein["pairedMsa"], "");
        assert_eq!(protein["templates"], serde_json::json!([]));
    }

    #[test]
    fn test_protein_upload_sets_msa_paths() {
        let json = serde_json::to_value(task(
            "job_name,type,id,sequence,msa_option,unpaired_msa,paired_msa\n\
             j,protein,A,MKT,upload,msas/a.a3m,msas/a_paired.a3m\n",
        ))
        .unwrap();
        let protein = &json["sequences"][0]["protein"];
        assert_eq!(protein["unpairedMsaPath"], "msas/a.a3m");
        assert_eq!(protein["pairedMsaPath"], "msas/a_paired.a3m");
        assert!(protein.get("unpairedMsa").is_none());
    }

    #[test]
    fn test_rna_msa_options() {
        let json = serde_json::to_value(task(
            "job_name,type,id,sequence,msa_option\nj,rna,A,GGAU,none\n",
        ))
        .unwrap();
        assert_eq!(json["sequences"][0]["rna"]["unpairedMsa"], "");
    }

    #[test]
    fn test_dna_has_no_msa_concept() {
        let json =
            serde_json::to_value(task("job_name,type,id,sequence\nj,dna,A,ACGT\n")).unwrap();
        let dna = &json["sequences"][0]["dna"];
        assert_eq!(dna["sequence"], "ACGT");
        assert!(dna.get("unpairedMsa").is_none());
    }

    #[test]
    fn test_ligand_smiles_exclusive() {
        let json = serde_json::to_value(task(
            "job_name,type,id,sequence\nj,ligand,A,CC(=O)O\n",
        ))
        .unwrap();
        let ligand = &json["sequences"][0]["ligand"];
        assert_eq!(ligand["smiles"], "CC(=O)O");
        assert!(ligand.get("ccdCodes").is_none());
    }

    #[test]
    fn test_ligand_ccd_list() {
        let json = serde_json::to_value(task(
            "job_name,type,id,sequence,ccd_codes\nj,ligand,A,,\"ATP, MG\"\n",
        ))
        .unwrap();
        assert_eq!(
            json["sequences"][0]["ligand"]["ccdCodes"],
            serde_json::json!(["ATP", "MG"])
        );
    }

    #[test]
    fn test_modifications_parsed_and_malformed_ignored() {
        let good = task(
            "job_name,type,id,sequence,modifications\n\
             j,protein,A,MKT,\"[{\"\"ptmType\"\": \"\"HY3\"\", \"\"ptmPosition\"\": 1}]\"\n",
        );
        let json = serde_json::to_value(good).unwrap();
        assert_eq!(
            json["sequences"][0]["protein"]["modifications"][0]["ptmType"],
            "HY3"
        );

        let bad = task("job_name,type,id,sequence,modifications\nj,protein,A,MKT,not-json\n");
        let json = serde_json::to_value(bad).unwrap();
        assert!(json["sequences"][0]["protein"].get("modifications").is_none());
    }

    #[test]
    fn test_job_level_fields_first_non_null_wins() {
        let sheet = "job_name,type,id,sequence,user_ccd,model_seeds\n\
                     j,protein,A,MKT,,\n\
                     j,protein,B,GGG,data_block,\"4,5\"\n";
        let t = table(sheet);
        let jobs = t.jobs();
        let task = build_task(jobs[0].0, &jobs[0].1).unwrap();
        assert_eq!(task.user_ccd.as_deref(), Some("data_block"));
        // The first non-empty model_seeds in the group applies to the job.
        assert_eq!(task.model_seeds, vec![4, 5]);
    }
}
