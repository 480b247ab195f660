//! Dependency staging.
//!
//! `Solver` orders every module and deploy of a build into stages such that
//! each node only depends on nodes of strictly earlier stages, decides which
//! modules are stale, and collects the final targets. `SubModuleSolver` does
//! the same for the partitions inside one C++20 module.

mod cycles;
mod observer;
mod partition;
mod round;
mod solver;
mod types;

pub use observer::{NoopObserver, SolveObserver, TracingObserver};
pub use partition::{PartitionIssues, SubModuleSolver};
pub use solver::{SolveInput, Solver};
pub use types::{
  CycleScope, NodeKind, NodeRecord, PartitionStage, SolveError, Stage, StagedModuleInfo, StagedPartition, Timeline,
  UnresolvedRef,
};
