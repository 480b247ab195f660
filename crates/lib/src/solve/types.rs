//! Types shared by the module and partition solvers.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::deploy::DeployError;
use crate::record::{DeployRecord, Domain, ModuleRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
  Module,
  Deploy,
}

/// The record a staged node wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRecord {
  Module(ModuleRecord),
  Deploy(DeployRecord),
}

impl NodeRecord {
  pub fn name(&self) -> &str {
    match self {
      NodeRecord::Module(m) => &m.name,
      NodeRecord::Deploy(d) => &d.name,
    }
  }

  pub fn kind(&self) -> NodeKind {
    match self {
      NodeRecord::Module(_) => NodeKind::Module,
      NodeRecord::Deploy(_) => NodeKind::Deploy,
    }
  }

  pub fn linker_options(&self) -> &[String] {
    match self {
      NodeRecord::Module(m) => &m.linker_options,
      NodeRecord::Deploy(d) => &d.linker_options,
    }
  }
}

/// A node of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedModuleInfo {
  pub name: String,
  pub kind: NodeKind,
  pub domain: Domain,
  /// Stored hash matched and no dependency was rebuilt.
  pub up_to_date: bool,
  pub depends_on: BTreeSet<String>,
  /// Partition stages of a C++20 module, empty otherwise.
  pub partition_order: Vec<PartitionStage>,
  /// Current content hash, persisted after a successful build.
  pub actual_hash: Option<String>,
  pub record: NodeRecord,
}

impl StagedModuleInfo {
  pub fn module(&self) -> Option<&ModuleRecord> {
    match &self.record {
      NodeRecord::Module(m) => Some(m),
      NodeRecord::Deploy(_) => None,
    }
  }

  pub fn deploy(&self) -> Option<&DeployRecord> {
    match &self.record {
      NodeRecord::Deploy(d) => Some(d),
      NodeRecord::Module(_) => None,
    }
  }
}

/// Nodes that can be built in parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
  pub nodes: Vec<StagedModuleInfo>,
}

impl Stage {
  pub fn names(&self) -> Vec<&str> {
    self.nodes.iter().map(|n| n.name.as_str()).collect()
  }
}

/// Ordered stages plus the final targets linked into the executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
  pub stages: Vec<Stage>,
  pub final_targets: Vec<StagedModuleInfo>,
}

impl Timeline {
  pub fn nodes(&self) -> impl Iterator<Item = &StagedModuleInfo> {
    self.stages.iter().flat_map(|s| s.nodes.iter())
  }

  pub fn node(&self, name: &str) -> Option<&StagedModuleInfo> {
    self.nodes().find(|n| n.name == name)
  }

  /// Index of the stage holding `name`.
  pub fn stage_of(&self, name: &str) -> Option<usize> {
    self
      .stages
      .iter()
      .position(|s| s.nodes.iter().any(|n| n.name == name))
  }

  pub fn stage_names(&self) -> Vec<Vec<&str>> {
    self.stages.iter().map(Stage::names).collect()
  }

  /// Modules that need compiling.
  pub fn stale_modules(&self) -> impl Iterator<Item = &StagedModuleInfo> {
    self.nodes().filter(|n| n.kind == NodeKind::Module && !n.up_to_date)
  }
}

/// A partition with its import list narrowed to sibling partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedPartition {
  pub name: String,
  pub interface: Option<PathBuf>,
  pub implementation: Option<PathBuf>,
  pub imports: BTreeSet<String>,
  pub domain: Domain,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionStage {
  pub partitions: Vec<StagedPartition>,
}

impl PartitionStage {
  pub fn names(&self) -> Vec<&str> {
    self.partitions.iter().map(|p| p.name.as_str()).collect()
  }
}

/// Names a node failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRef {
  pub node: String,
  pub missing: Vec<String>,
}

impl fmt::Display for UnresolvedRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} -> [{}]", self.node, self.missing.join(", "))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleScope {
  Modules,
  Partitions { module: String },
}

impl fmt::Display for CycleScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CycleScope::Modules => write!(f, "modules"),
      CycleScope::Partitions { module } => write!(f, "partitions of {module}"),
    }
  }
}

#[derive(Debug, Error)]
pub enum SolveError {
  #[error("duplicate module names: {}", .names.join(", "))]
  DuplicateModuleName { names: Vec<String> },

  #[error("unresolved imports: {}", join(.unresolved))]
  UnresolvedImport { unresolved: Vec<UnresolvedRef> },

  #[error("unknown partitions referenced: {}", join(.unresolved))]
  UnknownPartition { unresolved: Vec<UnresolvedRef> },

  #[error("partitions without an interface unit: {}", .partitions.join(", "))]
  MissingPartitionInterface { partitions: Vec<String> },

  #[error("final targets name no discovered module: {}", .names.join(", "))]
  UnresolvedFinalTarget { names: Vec<String> },

  #[error("circular dependency among {scope}: {}{}", join(.stuck), describe_cycles(.cycles))]
  CircularDependency {
    scope: CycleScope,
    stuck: Vec<UnresolvedRef>,
    cycles: Vec<Vec<String>>,
  },

  #[error("failed to read stored hash of {module}: {source}")]
  StoredHash {
    module: String,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Deploy(#[from] DeployError),
}

fn join<T: fmt::Display>(items: &[T]) -> String {
  items.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

fn describe_cycles(cycles: &[Vec<String>]) -> String {
  if cycles.is_empty() {
    return String::new();
  }
  let rendered: Vec<String> = cycles
    .iter()
    .map(|c| {
      let mut path = c.clone();
      if let Some(first) = c.first() {
        path.push(first.clone());
      }
      path.join(" -> ")
    })
    .collect();
  format!(" (cycles: {})", rendered.join("; "))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cycle_message_lists_stuck_nodes_and_cycles() {
    let err = SolveError::CircularDependency {
      scope: CycleScope::Modules,
      stuck: vec![
        UnresolvedRef {
          node: "X".to_string(),
          missing: vec!["Y".to_string()],
        },
        UnresolvedRef {
          node: "Y".to_string(),
          missing: vec!["X".to_string()],
        },
      ],
      cycles: vec![vec!["X".to_string(), "Y".to_string()]],
    };

    assert_eq!(
      err.to_string(),
      "circular dependency among modules: X -> [Y]; Y -> [X] (cycles: X -> Y -> X)"
    );
  }

  #[test]
  fn unresolved_message_lists_every_node() {
    let err = SolveError::UnresolvedImport {
      unresolved: vec![
        UnresolvedRef {
          node: "Game".to_string(),
          missing: vec!["Audio".to_string(), "Net".to_string()],
        },
        UnresolvedRef {
          node: "Tools".to_string(),
          missing: vec!["Editor".to_string()],
        },
      ],
    };
    assert_eq!(
      err.to_string(),
      "unresolved imports: Game -> [Audio, Net]; Tools -> [Editor]"
    );
  }
}
