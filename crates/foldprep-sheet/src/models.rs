//! Data models for the sample sheet.

use foldprep_common::{FoldprepError, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Run mode
// ---------------------------------------------------------------------------

/// Experiment design declared on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Custom,
    AllVsAll,
    Pulldown,
    VirtualDrugScreen,
    StoichiometryScreen,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Custom              => "custom",
            Mode::AllVsAll            => "all-vs-all",
            Mode::Pulldown            => "pulldown",
            Mode::VirtualDrugScreen   => "virtual-drug-screen",
            Mode::StoichiometryScreen => "stoichio-screen",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "custom"              => Ok(Mode::Custom),
            "all-vs-all"          => Ok(Mode::AllVsAll),
            "pulldown"            => Ok(Mode::Pulldown),
            "virtual-drug-screen" => Ok(Mode::VirtualDrugScreen),
            "stoichio-screen"     => Ok(Mode::StoichiometryScreen),
            other => Err(FoldprepError::Validation(format!(
                "unknown mode '{other}' (expected custom, all-vs-all, pulldown, \
                 virtual-drug-screen or stoichio-screen)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity kind
// ---------------------------------------------------------------------------

/// Biochemical type of one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Protein,
    Rna,
    Dna,
    Ligand,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Protein => "protein",
            EntityKind::Rna     => "rna",
            EntityKind::Dna     => "dna",
            EntityKind::Ligand  => "ligand",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "protein" => Ok(EntityKind::Protein),
            "rna"     => Ok(EntityKind::Rna),
            "dna"     => Ok(EntityKind::Dna),
            "ligand"  => Ok(EntityKind::Ligand),
            other => Err(FoldprepError::Validation(format!(
                "unknown entity type '{other}' (expected protein, rna, dna or ligand)"
            ))),
        }
    }

    /// Protein and RNA chains count toward multimer status and get their own
    /// precomputation sub-jobs; DNA and ligand chains do not.
    pub fn is_polymer(&self) -> bool {
        matches!(self, EntityKind::Protein | EntityKind::Rna)
    }
}

// ---------------------------------------------------------------------------
// MSA option
// ---------------------------------------------------------------------------

/// How the inference engine obtains the chain's MSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MsaOption {
    /// Engine computes MSAs itself; MSA fields are omitted from the task.
    Auto,
    /// Template-free, MSA-free: MSA fields set to empty strings.
    None,
    /// MSA path fields point at user-supplied alignments.
    Upload,
}

impl MsaOption {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "" | "auto" => Ok(MsaOption::Auto),
            "none"      => Ok(MsaOption::None),
            "upload"    => Ok(MsaOption::Upload),
            other => Err(FoldprepError::Validation(format!(
                "invalid msa_option '{other}' (expected auto, none or upload)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Role (mode-specific)
// ---------------------------------------------------------------------------

/// Role of a row in pulldown / virtual-drug-screen designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bait,
    Target,
    Drug,
}

// ---------------------------------------------------------------------------
// Sample row
// ---------------------------------------------------------------------------

/// One declared chain of one job, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub job_name: String,
    pub kind: EntityKind,
    /// Chain label, unique within the job.
    pub id: String,
    /// Residue sequence; empty for ligand chains.
    pub sequence: String,
    /// Raw JSON string; parsed lazily at serialization time.
    pub modifications: Option<String>,
    pub msa_option: MsaOption,
    pub unpaired_msa: Option<String>,
    pub paired_msa: Option<String>,
    /// Raw JSON string; parsed lazily at serialization time.
    pub templates: Option<String>,
    pub ccd_codes: Option<Vec<String>>,
    pub smiles: Option<String>,
    /// Parsed model seeds; empty means unspecified.
    pub model_seeds: Vec<i64>,
    /// Raw JSON string; parsed lazily at serialization time.
    pub bonded_atom_pairs: Option<String>,
    pub user_ccd: Option<String>,
    /// Pulldown / drug-screen role.
    pub role: Option<Role>,
    /// Grouping id merging rows into oligomeric sub-jobs (bait_id etc.).
    pub group_id: Option<String>,
    /// Copy count or `start,end` range (drug-screen / stoichiometry modes).
    pub count: Option<String>,
}
