//! foldprep-common — Shared types, errors, and naming/path policies used
//! across all foldprep crates.

pub mod error;
pub mod layout;
pub mod naming;

// Re-export commonly used types
pub use error::{FoldprepError, Result};
pub use layout::RunLayout;
pub use naming::{chain_label, sanitised_name};
