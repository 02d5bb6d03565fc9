//! foldprep-depmap — Multimer decomposition, monomer canonicalization, and
//! the dependency manifests the batch scheduler consumes.
//!
//! Every multimer job decomposes into one single-chain sub-job per polymer
//! chain; chains with identical sequence collapse to one canonical
//! precomputation artifact. The crate then emits three manifests:
//!   1. `data_pipeline_samples.tsv` — monomer precomputations to run
//!   2. `inference_to_data_pipeline_map.tsv` — which artifacts feed which
//!      inference inputs
//!   3. `inference_samples.tsv` — inference invocations with expected
//!      output locations, fanned out per seed and sample
//! Monomer task files whose artifact no mapping references are deleted, so
//! the precomputation worklist stays minimal.

pub mod canonical;
pub mod decompose;
pub mod manifests;

pub use canonical::{canonicalize, CanonicalArtifact, CanonicalMonomers};
pub use decompose::{decompose, Decomposition, MonomerUnit};
pub use manifests::{build_manifests, collect_garbage, write_manifests, Manifests};
