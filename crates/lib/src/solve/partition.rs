//! Partition staging inside one C++20 module.

use std::collections::{BTreeSet, HashSet};

use super::cycles::find_cycles;
use super::round::RoundState;
use super::types::{CycleScope, PartitionStage, SolveError, StagedPartition, UnresolvedRef};
use crate::record::{Domain, ModuleRecord, PartitionRecord};

/// Integrity problems found before partition staging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionIssues {
  /// `Module:partition` names lacking an interface unit.
  pub missing_interface: Vec<String>,
  /// Partitions importing a sibling that does not exist.
  pub unknown: Vec<UnresolvedRef>,
}

impl PartitionIssues {
  pub fn is_empty(&self) -> bool {
    self.missing_interface.is_empty() && self.unknown.is_empty()
  }

  pub fn extend(&mut self, other: PartitionIssues) {
    self.missing_interface.extend(other.missing_interface);
    self.unknown.extend(other.unknown);
  }

  /// Converts collected issues into the error reported for them, interface
  /// problems first.
  pub fn into_result(self) -> Result<(), SolveError> {
    if !self.missing_interface.is_empty() {
      return Err(SolveError::MissingPartitionInterface {
        partitions: self.missing_interface,
      });
    }
    if !self.unknown.is_empty() {
      return Err(SolveError::UnknownPartition { unresolved: self.unknown });
    }
    Ok(())
  }
}

/// Orders one module's partitions so every partition follows the siblings
/// it imports.
pub struct SubModuleSolver<'a> {
  module: &'a str,
  partitions: &'a [PartitionRecord],
  module_imports: &'a BTreeSet<String>,
  domain: Domain,
}

impl<'a> SubModuleSolver<'a> {
  pub fn new(module: &'a ModuleRecord, domain: Domain) -> Self {
    Self {
      module: &module.name,
      partitions: &module.partitions,
      module_imports: &module.imports,
      domain,
    }
  }

  /// Partitions with imports narrowed to sibling partitions.
  ///
  /// Whole-module imports of the owning module and header units (names
  /// starting with `<`) are dropped. A leading `:` is stripped, so both
  /// `:math` and `math` name the sibling partition `math`.
  pub fn working_set(&self) -> Vec<StagedPartition> {
    self
      .partitions
      .iter()
      .map(|p| StagedPartition {
        name: p.name.clone(),
        interface: p.interface.clone(),
        implementation: p.implementation.clone(),
        imports: p
          .imports
          .iter()
          .filter(|i| !i.starts_with('<') && !self.module_imports.contains(*i))
          .map(|i| i.trim_start_matches(':').to_string())
          .collect(),
        domain: self.domain,
      })
      .collect()
  }

  /// Collects partitions without an interface and imports of unknown
  /// siblings.
  pub fn check(&self) -> PartitionIssues {
    let working = self.working_set();
    let known: HashSet<&str> = working.iter().map(|p| p.name.as_str()).collect();
    let mut issues = PartitionIssues::default();

    for partition in &working {
      if partition.interface.is_none() {
        issues.missing_interface.push(self.qualified(&partition.name));
      }
      let missing: Vec<String> = partition
        .imports
        .iter()
        .filter(|i| !known.contains(i.as_str()))
        .cloned()
        .collect();
      if !missing.is_empty() {
        issues.unknown.push(UnresolvedRef {
          node: self.qualified(&partition.name),
          missing,
        });
      }
    }

    issues
  }

  /// Stages the partitions. Partitions without imports form the first stage.
  pub fn solve(&self) -> Result<Vec<PartitionStage>, SolveError> {
    self.check().into_result()?;

    let working = self.working_set();
    let mut stages = Vec::new();
    let mut round = RoundState::initial(working.len());

    while !round.is_done() {
      round = round.plan(|i, resolved| working[i].imports.iter().all(|imp| resolved.contains(imp)));

      if round.is_stuck() {
        let stuck: Vec<(String, Vec<String>)> = round
          .remaining
          .iter()
          .map(|&i| {
            let unresolved = working[i]
              .imports
              .iter()
              .filter(|imp| !round.resolved.contains(*imp))
              .cloned()
              .collect();
            (working[i].name.clone(), unresolved)
          })
          .collect();

        return Err(SolveError::CircularDependency {
          scope: CycleScope::Partitions {
            module: self.module.to_string(),
          },
          cycles: find_cycles(&stuck),
          stuck: stuck
            .into_iter()
            .map(|(node, missing)| UnresolvedRef { node, missing })
            .collect(),
        });
      }

      let stage = PartitionStage {
        partitions: round.stageable.iter().map(|&i| working[i].clone()).collect(),
      };
      round = round.advance(stage.partitions.iter().map(|p| p.name.clone()));
      stages.push(stage);
    }

    Ok(stages)
  }

  fn qualified(&self, partition: &str) -> String {
    format!("{}:{}", self.module, partition)
  }
}
