//! Serde model of the engine's task JSON.
//!
//! Field presence is meaningful to the engine: an omitted MSA field means
//! "compute it", an empty string means "run without", a path means "load
//! from here". Optional fields therefore use `skip_serializing_if` rather
//! than serializing nulls.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DIALECT: &str = "alphafold3";
pub const VERSION: u32 = 1;

/// Complete input for one engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    #[serde(rename = "modelSeeds")]
    pub model_seeds: Vec<i64>,
    pub sequences: Vec<SequenceEntry>,
    pub dialect: String,
    pub version: u32,
    #[serde(rename = "bondedAtomPairs", skip_serializing_if = "Option::is_none")]
    pub bonded_atom_pairs: Option<Value>,
    #[serde(rename = "userCCD", skip_serializing_if = "Option::is_none")]
    pub user_ccd: Option<String>,
}

/// One chain, tagged by its biochemical type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceEntry {
    Protein(ProteinEntry),
    Rna(RnaEntry),
    Dna(DnaEntry),
    Ligand(LigandEntry),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProteinEntry {
    pub id: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Value>,
    #[serde(rename = "unpairedMsa", skip_serializing_if = "Option::is_none")]
    pub unpaired_msa: Option<String>,
    #[serde(rename = "pairedMsa", skip_serializing_if = "Option::is_none")]
    pub paired_msa: Option<String>,
    #[serde(rename = "unpairedMsaPath", skip_serializing_if = "Option::is_none")]
    pub unpaired_msa_path: Option<String>,
    #[serde(rename = "pairedMsaPath", skip_serializing_if = "Option::is_none")]
    pub paired_msa_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RnaEntry {
    pub id: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Value>,
    #[serde(rename = "unpairedMsa", skip_serializing_if = "Option::is_none")]
    pub unpaired_msa: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnaEntry {
    pub id: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LigandEntry {
    pub id: String,
    #[serde(rename = "ccdCodes", skip_serializing_if = "Option::is_none")]
    pub ccd_codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smiles: Option<String>,
}
