//! foldprep — Batch preparation for a structure-inference engine.
//!
//! Expands a declarative sample sheet into the exact set of engine task
//! files, collapses computation-equivalent jobs, decomposes multimers into
//! shared single-chain precomputations, and emits the manifests a batch
//! scheduler needs to run the minimum necessary work.

pub mod pipeline;

pub use pipeline::{run, RunOptions, RunReport};
