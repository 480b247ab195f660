//! JSON schemas of the descriptor files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::deploy::DeployAction;

/// `<anything>.module.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModuleDescriptor {
  pub name: String,
  #[serde(default)]
  pub imports: Vec<String>,
  #[serde(default = "default_includes")]
  pub includes: Vec<PathBuf>,
  /// Stem of the primary interface unit, defaults to the module name.
  #[serde(default)]
  pub entry: Option<String>,
  /// `false` marks a legacy module built from plain translation units.
  #[serde(default = "default_true")]
  pub module: bool,
  #[serde(default)]
  pub sources: Vec<PathBuf>,
  #[serde(default)]
  pub linker_options: Vec<String>,
}

/// `<anything>.deploy.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeployDescriptor {
  pub name: String,
  #[serde(default)]
  pub includes: Vec<PathBuf>,
  #[serde(default)]
  pub static_libs: Vec<PathBuf>,
  #[serde(default)]
  pub dynamic_libs: Vec<PathBuf>,
  #[serde(default)]
  pub linker_options: Vec<String>,
  #[serde(default)]
  pub compiled: bool,
  #[serde(default)]
  pub sources: Vec<PathBuf>,
  #[serde(default)]
  pub actions: Vec<DeployAction>,
}

/// `<anything>.rules.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesDescriptor {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub finals: Vec<String>,
}

fn default_includes() -> Vec<PathBuf> {
  vec![PathBuf::from(".")]
}

fn default_true() -> bool {
  true
}
