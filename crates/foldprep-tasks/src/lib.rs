//! foldprep-tasks — Task descriptors for the structure-inference engine.
//!
//! One descriptor is the complete input for one engine invocation: job name,
//! model seeds, one tagged entry per chain, plus optional bonded-atom pairs
//! and user CCD data. Multimer jobs fan out to one file per seed; monomer
//! (precomputation) jobs get a single file carrying the full seed list —
//! their seed fan-out happens at inference time, not at precomputation time.

pub mod builder;
pub mod descriptor;
pub mod writer;

pub use builder::build_task;
pub use descriptor::{
    DnaEntry, LigandEntry, ProteinEntry, RnaEntry, SequenceEntry, TaskDescriptor,
};
pub use writer::{write_job_tasks, TaskWriteSummary};
