//! foldprep-sheet — Sample-sheet reading and normalization.
//!
//! Turns a raw tab- or comma-separated sample sheet into validated
//! `SampleRow`s: required columns checked per run mode, unexpected columns
//! rejected, names sanitized to filesystem-safe tokens, ligand chains
//! resolved to exactly one of SMILES / CCD codes. Validation failures abort
//! the whole run before any output is written.

pub mod models;
pub mod reader;

pub use models::{EntityKind, Mode, MsaOption, Role, SampleRow};
pub use reader::{parse_sample_sheet, read_sample_sheet};
