use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deploy::DeployAction;

/// Which source root a node was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
  Engine,
  Project,
}

impl fmt::Display for Domain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Domain::Engine => write!(f, "Engine"),
      Domain::Project => write!(f, "Project"),
    }
  }
}

/// A named sub-unit of a C++20 module (`export module M:part;`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRecord {
  pub name: String,
  pub interface: Option<PathBuf>,
  pub implementation: Option<PathBuf>,
  /// Raw import names; may include whole-module and header-unit imports.
  pub imports: BTreeSet<String>,
}

impl PartitionRecord {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn with_interface(mut self, path: impl Into<PathBuf>) -> Self {
    self.interface = Some(path.into());
    self
  }

  pub fn with_implementation(mut self, path: impl Into<PathBuf>) -> Self {
    self.implementation = Some(path.into());
    self
  }

  pub fn with_imports<I, S>(mut self, imports: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.imports.extend(imports.into_iter().map(Into::into));
    self
  }

  /// Folds another unit of the same partition into this one.
  ///
  /// Fields already set are kept; empty fields take the other unit's value.
  /// Imports are unioned.
  pub fn merge(&mut self, other: PartitionRecord) {
    if self.interface.is_none() {
      self.interface = other.interface;
    }
    if self.implementation.is_none() {
      self.implementation = other.implementation;
    }
    self.imports.extend(other.imports);
  }
}

/// One buildable module discovered from a module descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
  pub name: String,
  /// Module source directory.
  pub path: PathBuf,
  /// SHA-256 over every file under `path`.
  pub content_hash: String,
  pub imports: BTreeSet<String>,
  /// Include directories, relative to `path`.
  pub includes: Vec<PathBuf>,
  pub linker_options: Vec<String>,
  /// `false` for legacy translation-unit modules.
  pub is_cxx_module: bool,
  /// Stem of the primary interface unit when it differs from the module name.
  pub entry: Option<String>,
  pub interface_unit: Option<PathBuf>,
  pub implementation_unit: Option<PathBuf>,
  /// Translation units of a legacy module.
  pub sources: Vec<PathBuf>,
  pub partitions: Vec<PartitionRecord>,
}

impl ModuleRecord {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      content_hash: String::new(),
      imports: BTreeSet::new(),
      includes: vec![PathBuf::from(".")],
      linker_options: Vec::new(),
      is_cxx_module: true,
      entry: None,
      interface_unit: None,
      implementation_unit: None,
      sources: Vec::new(),
      partitions: Vec::new(),
    }
  }

  pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
    self.content_hash = hash.into();
    self
  }

  pub fn with_imports<I, S>(mut self, imports: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.imports.extend(imports.into_iter().map(Into::into));
    self
  }

  pub fn with_partition(mut self, partition: PartitionRecord) -> Self {
    self.add_partition(partition);
    self
  }

  /// Builds a legacy module compiled file by file.
  pub fn legacy(mut self, sources: Vec<PathBuf>) -> Self {
    self.is_cxx_module = false;
    self.sources = sources;
    self
  }

  /// Adds a partition, merging with an existing partition of the same name.
  pub fn add_partition(&mut self, partition: PartitionRecord) {
    match self.partitions.iter_mut().find(|p| p.name == partition.name) {
      Some(existing) => existing.merge(partition),
      None => self.partitions.push(partition),
    }
  }

  /// Stem used to locate the primary interface and implementation units.
  pub fn entry_stem(&self) -> &str {
    self.entry.as_deref().unwrap_or(&self.name)
  }

  /// Include directories resolved against the module directory.
  pub fn include_dirs(&self) -> Vec<PathBuf> {
    resolve_all(&self.path, &self.includes)
  }
}

/// A prebuilt or third-party package consumed as a graph leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRecord {
  pub name: String,
  /// Directory holding the deploy descriptor.
  pub path: PathBuf,
  pub includes: Vec<PathBuf>,
  pub static_libs: Vec<PathBuf>,
  pub dynamic_libs: Vec<PathBuf>,
  pub linker_options: Vec<String>,
  pub actions: Vec<DeployAction>,
  /// Whether `sources` are compiled into a library of their own.
  pub compiled: bool,
  pub sources: Vec<PathBuf>,
}

impl DeployRecord {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      includes: Vec::new(),
      static_libs: Vec::new(),
      dynamic_libs: Vec::new(),
      linker_options: Vec::new(),
      actions: Vec::new(),
      compiled: false,
      sources: Vec::new(),
    }
  }

  pub fn with_action(mut self, action: DeployAction) -> Self {
    self.actions.push(action);
    self
  }

  pub fn include_dirs(&self) -> Vec<PathBuf> {
    resolve_all(&self.path, &self.includes)
  }

  pub fn static_lib_paths(&self) -> Vec<PathBuf> {
    resolve_all(&self.path, &self.static_libs)
  }

  pub fn dynamic_lib_paths(&self) -> Vec<PathBuf> {
    resolve_all(&self.path, &self.dynamic_libs)
  }
}

/// Names the final targets linked into the executable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
  pub name: String,
  pub finals: Vec<String>,
}

/// Everything discovered under one domain root, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleList {
  pub modules: Vec<ModuleRecord>,
  pub deploys: Vec<DeployRecord>,
  pub rules: Vec<Rules>,
}

impl ModuleList {
  pub fn is_empty(&self) -> bool {
    self.modules.is_empty() && self.deploys.is_empty()
  }

  /// Final target names across all rules, in declaration order.
  pub fn finals(&self) -> impl Iterator<Item = &str> {
    self.rules.iter().flat_map(|r| r.finals.iter().map(String::as_str))
  }

  /// Whether any deploy clones a git repository.
  pub fn needs_git(&self) -> bool {
    self
      .deploys
      .iter()
      .any(|d| d.actions.iter().any(|a| matches!(a, DeployAction::GitClone { .. })))
  }
}

fn resolve_all(base: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
  paths
    .iter()
    .map(|p| if p.is_absolute() { p.clone() } else { base.join(p) })
    .collect()
}
