//! Records produced by the scanner and consumed by the solver.
//!
//! Records are plain data: a `ModuleRecord` per module descriptor, a
//! `DeployRecord` per third-party deploy and the `Rules` naming final
//! targets. A `ModuleList` gathers everything discovered in one domain.

mod types;

pub use types::{DeployRecord, Domain, ModuleList, ModuleRecord, PartitionRecord, Rules};
