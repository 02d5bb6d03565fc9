//! Sample-sheet reader and per-mode validation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use foldprep_common::{sanitised_name, FoldprepError, Result};
use tracing::debug;

use crate::models::{EntityKind, Mode, MsaOption, Role, SampleRow};

const REQUIRED_COLUMNS: &[&str] = &["job_name", "type", "id", "sequence"];

const OPTIONAL_COLUMNS: &[&str] = &[
    "modifications",
    "msa_option",
    "unpaired_msa",
    "paired_msa",
    "templates",
    "smiles",
    "ccd_codes",
    "model_seeds",
    "bonded_atom_pairs",
    "user_ccd",
];

/// Characters whose presence marks a ligand string as SMILES rather than a
/// CCD code.
const SMILES_HINT_CHARS: &str = "=#()123";

/// Read and normalize a sample sheet for the given run mode.
pub fn read_sample_sheet<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Vec<SampleRow>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_sample_sheet(&content, mode)
}

/// Parse sample-sheet content. Tab- and comma-separated sheets are both
/// accepted; the delimiter is inferred from the header line.
pub fn parse_sample_sheet(content: &str, mode: Mode) -> Result<Vec<SampleRow>> {
    let header_line = content.lines().next().unwrap_or_default();
    let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    validate_columns(&headers, mode)?;

    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();

    let mut rows = Vec::new();
    let mut seen_ids: HashMap<String, HashSet<String>> = HashMap::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let get = |col: &str| -> Option<String> {
            index
                .get(col)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let row = build_row(&get, mode, line + 2)?;

        if !seen_ids
            .entry(row.job_name.clone())
            .or_default()
            .insert(row.id.clone())
        {
            return Err(FoldprepError::Validation(format!(
                "duplicate chain id '{}' in job '{}'",
                row.id, row.job_name
            )));
        }
        rows.push(row);
    }

    debug!(rows = rows.len(), mode = mode.as_str(), "Sample sheet parsed");
    Ok(rows)
}

/// Required and allowed column sets per mode; anything outside the allowed
/// set is rejected so a misspelled column fails loudly instead of being
/// silently ignored.
fn validate_columns(headers: &[String], mode: Mode) -> Result<()> {
    let mode_required: &[&str] = match mode {
        Mode::Custom | Mode::AllVsAll => &[],
        Mode::Pulldown                => &["bait_or_target"],
        Mode::VirtualDrugScreen       => &["drug_or_target"],
        Mode::StoichiometryScreen     => &["count"],
    };
    let mode_optional: &[&str] = match mode {
        Mode::Custom | Mode::AllVsAll => &[],
        Mode::Pulldown                => &["bait_id", "target_id"],
        Mode::VirtualDrugScreen       => &["drug_id", "target_id", "count"],
        Mode::StoichiometryScreen     => &[],
    };

    for col in REQUIRED_COLUMNS.iter().chain(mode_required) {
        if !headers.iter().any(|h| h == col) {
            return Err(FoldprepError::Validation(format!(
                "missing required column '{col}' for mode '{}'",
                mode.as_str()
            )));
        }
    }

    for header in headers {
        let allowed = REQUIRED_COLUMNS.contains(&header.as_str())
            || OPTIONAL_COLUMNS.contains(&header.as_str())
            || mode_required.contains(&header.as_str())
            || mode_optional.contains(&header.as_str());
        if !allowed {
            return Err(FoldprepError::Validation(format!(
                "unexpected column '{header}' for mode '{}'",
                mode.as_str()
            )));
        }
    }
    Ok(())
}

fn build_row(get: &dyn Fn(&str) -> Option<String>, mode: Mode, line: usize) -> Result<SampleRow> {
    let job_name = get("job_name")
        .map(|v| sanitised_name(&v))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            FoldprepError::Validation(format!("line {line}: empty or missing job_name"))
        })?;
    let id = get("id")
        .map(|v| sanitised_name(&v))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FoldprepError::Validation(format!("line {line}: empty or missing id")))?;

    let kind_raw = get("type").ok_or_else(|| {
        FoldprepError::Validation(format!("line {line}: empty or missing type"))
    })?;
    let kind = EntityKind::parse(&kind_raw)?;

    let sequence = get("sequence").unwrap_or_default();
    let msa_option = MsaOption::parse(get("msa_option").as_deref().unwrap_or(""))?;
    let model_seeds = parse_seed_list(get("model_seeds").as_deref())?;
    let role = parse_role(get, mode)?;

    let group_id = match role {
        Some(Role::Bait)   => get("bait_id"),
        Some(Role::Target) => get("target_id"),
        Some(Role::Drug)   => get("drug_id"),
        None               => None,
    };

    let smiles = get("smiles");
    let ccd_codes = get("ccd_codes").map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    let mut row = SampleRow {
        job_name,
        kind,
        id,
        sequence,
        modifications: get("modifications"),
        msa_option,
        unpaired_msa: get("unpaired_msa"),
        paired_msa: get("paired_msa"),
        templates: get("templates"),
        ccd_codes,
        smiles,
        model_seeds,
        bonded_atom_pairs: get("bonded_atom_pairs"),
        user_ccd: get("user_ccd"),
        role,
        group_id,
        count: get("count"),
    };
    resolve_chain_content(&mut row)?;
    Ok(row)
}

fn parse_role(get: &dyn Fn(&str) -> Option<String>, mode: Mode) -> Result<Option<Role>> {
    match mode {
        Mode::Pulldown => match get("bait_or_target").as_deref() {
            Some("bait")   => Ok(Some(Role::Bait)),
            Some("target") => Ok(Some(Role::Target)),
            Some(other) => Err(FoldprepError::Validation(format!(
                "invalid bait_or_target value '{other}' (expected bait or target)"
            ))),
            None => Err(FoldprepError::Validation(
                "empty bait_or_target value".to_string(),
            )),
        },
        Mode::VirtualDrugScreen => match get("drug_or_target").as_deref() {
            Some("drug")   => Ok(Some(Role::Drug)),
            Some("target") => Ok(Some(Role::Target)),
            Some(other) => Err(FoldprepError::Validation(format!(
                "invalid drug_or_target value '{other}' (expected drug or target)"
            ))),
            None => Err(FoldprepError::Validation(
                "empty drug_or_target value".to_string(),
            )),
        },
        _ => Ok(None),
    }
}

fn parse_seed_list(raw: Option<&str>) -> Result<Vec<i64>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|_| {
                FoldprepError::Validation(format!("invalid model_seeds entry '{s}'"))
            })
        })
        .collect()
}

/// Enforce which of sequence / smiles / ccd_codes is authoritative for the
/// chain's kind.
///
/// Polymer chains must carry a sequence. Ligand chains must end up with
/// exactly one of SMILES or CCD codes: a bare sequence value is routed by a
/// content heuristic, and a row with both fields set (or none derivable) is
/// rejected.
fn resolve_chain_content(row: &mut SampleRow) -> Result<()> {
    if row.kind != EntityKind::Ligand {
        if row.sequence.is_empty() {
            return Err(FoldprepError::Validation(format!(
                "{} chain '{}' in job '{}' has an empty sequence",
                row.kind.as_str(),
                row.id,
                row.job_name
            )));
        }
        return Ok(());
    }

    let has_smiles = row.smiles.is_some();
    let has_ccd = row.ccd_codes.as_ref().is_some_and(|c| !c.is_empty());

    match (has_smiles, has_ccd) {
        (true, true) => {
            return Err(FoldprepError::Validation(format!(
                "ligand '{}' in job '{}' sets both ccd_codes and smiles; provide exactly one",
                row.id, row.job_name
            )));
        }
        (false, false) => {
            if row.sequence.is_empty() {
                return Err(FoldprepError::Validation(format!(
                    "ligand '{}' in job '{}' needs either ccd_codes or smiles",
                    row.id, row.job_name
                )));
            }
            // Route the sequence column: SMILES strings carry structural
            // punctuation that CCD codes never do.
            if row.sequence.chars().any(|c| SMILES_HINT_CHARS.contains(c)) {
                row.smiles = Some(row.sequence.clone());
            } else {
                row.ccd_codes = Some(vec![row.sequence.clone()]);
            }
        }
        _ => {}
    }
    row.sequence = String::new();
    Ok(())
}
