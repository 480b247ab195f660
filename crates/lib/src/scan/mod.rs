//! Source tree scanning.
//!
//! Crawls a domain root for descriptor files and turns them into records:
//! `*.module.json` into `ModuleRecord`, `*.deploy.json` into `DeployRecord`
//! and `*.rules.json` into `Rules`. C++20 module directories are also
//! scraped for their interface, implementation and partition units.

pub mod descriptor;
pub mod partitions;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::Target;
use crate::consts::{DEPLOY_DESCRIPTOR_SUFFIX, MODULE_DESCRIPTOR_SUFFIX, RULES_DESCRIPTOR_SUFFIX, SCAN_SKIP_DIRS};
use crate::record::{DeployRecord, ModuleList, ModuleRecord, Rules};
use crate::solve::SolveInput;
use crate::util::hash::{ContentHash, DirHashError, hash_directory_filtered};

use descriptor::{DeployDescriptor, ModuleDescriptor, RulesDescriptor};
use partitions::{ModuleUnits, STD_MODULES, scan_unit};

const INTERFACE_EXTENSIONS: &[&str] = &["cppm", "ixx", "mpp"];
const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx"];

#[derive(Debug, Error)]
pub enum ScanError {
  #[error("failed to walk {path}: {message}")]
  Walk { path: PathBuf, message: String },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid descriptor {path}: {source}")]
  Descriptor {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to hash module {module}: {source}")]
  Hash {
    module: String,
    #[source]
    source: DirHashError,
  },
}

/// Scans the domains a target builds.
pub fn load_target(target: &Target) -> Result<SolveInput, ScanError> {
  let mut input = SolveInput::project(scan_domain(&target.project_path)?);
  if let Some(engine) = target.engine_path.as_deref().filter(|_| target.include_engine) {
    input = input.with_engine(scan_domain(engine)?);
  }
  Ok(input)
}

/// Collects every descriptor under `root`, in file-name order.
pub fn scan_domain(root: &Path) -> Result<ModuleList, ScanError> {
  let mut list = ModuleList::default();

  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

  for entry in walker {
    let entry = entry.map_err(|e| ScanError::Walk {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let Some(file_name) = entry.file_name().to_str() else {
      continue;
    };
    let path = entry.path();
    let dir = path.parent().unwrap_or(root);

    if file_name.ends_with(MODULE_DESCRIPTOR_SUFFIX) {
      let desc: ModuleDescriptor = read_descriptor(path)?;
      list.modules.push(module_record(desc, dir)?);
    } else if file_name.ends_with(DEPLOY_DESCRIPTOR_SUFFIX) {
      let desc: DeployDescriptor = read_descriptor(path)?;
      list.deploys.push(deploy_record(desc, dir));
    } else if file_name.ends_with(RULES_DESCRIPTOR_SUFFIX) {
      let desc: RulesDescriptor = read_descriptor(path)?;
      let name = desc
        .name
        .unwrap_or_else(|| file_name.trim_end_matches(RULES_DESCRIPTOR_SUFFIX).to_string());
      list.rules.push(Rules {
        name,
        finals: desc.finals,
      });
    }
  }

  info!(
    root = ?root,
    modules = list.modules.len(),
    deploys = list.deploys.len(),
    rules = list.rules.len(),
    "scanned domain"
  );
  Ok(list)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
  entry.file_type().is_dir()
    && entry
      .file_name()
      .to_str()
      .is_some_and(|name| name.starts_with('.') || SCAN_SKIP_DIRS.contains(&name))
}

fn read_descriptor<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScanError> {
  let contents = fs::read_to_string(path).map_err(|source| ScanError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&contents).map_err(|source| ScanError::Descriptor {
    path: path.to_path_buf(),
    source,
  })
}

fn module_record(desc: ModuleDescriptor, dir: &Path) -> Result<ModuleRecord, ScanError> {
  let content_hash = module_hash(dir).map_err(|source| ScanError::Hash {
    module: desc.name.clone(),
    source,
  })?;

  let mut record = ModuleRecord::new(desc.name, dir)
    .with_hash(content_hash.0)
    .with_imports(desc.imports.into_iter().filter(|i| !STD_MODULES.contains(&i.as_str())));
  record.includes = desc.includes;
  record.linker_options = desc.linker_options;
  record.entry = desc.entry;

  if !desc.module {
    let sources = if desc.sources.is_empty() {
      files_with_extension(dir, SOURCE_EXTENSIONS)?
    } else {
      desc.sources.iter().map(|s| dir.join(s)).collect()
    };
    return Ok(record.legacy(sources));
  }

  let mut units = ModuleUnits::default();
  let mut candidates = files_with_extension(dir, INTERFACE_EXTENSIONS)?;
  candidates.extend(files_with_extension(dir, SOURCE_EXTENSIONS)?);
  for path in candidates {
    let text = fs::read_to_string(&path).map_err(|source| ScanError::Read {
      path: path.clone(),
      source,
    })?;
    units.add_unit(&record.name, &path, scan_unit(&text));
  }

  let stem = record.entry_stem().to_string();
  record.interface_unit = find_named(dir, &stem, INTERFACE_EXTENSIONS).or(units.interface);
  record.implementation_unit = find_named(dir, &stem, SOURCE_EXTENSIONS).or(units.implementation);
  record.imports.extend(units.module_imports);
  for partition in units.partitions {
    record.add_partition(partition);
  }

  debug!(
    module = %record.name,
    partitions = record.partitions.len(),
    interface = ?record.interface_unit,
    "scanned module"
  );
  Ok(record)
}

/// Hashes a module directory the way the crawl sees it.
///
/// Hidden entries, build output directories and subdirectories owned by
/// another descriptor do not contribute, so persisting a hash or editing a
/// nested module leaves this module's hash unchanged.
fn module_hash(dir: &Path) -> Result<ContentHash, DirHashError> {
  hash_directory_filtered(dir, |e| {
    let hidden = e.file_name().to_str().is_some_and(|name| name.starts_with('.'));
    hidden || is_skipped_dir(e) || (e.file_type().is_dir() && holds_descriptor(e.path()))
  })
}

fn holds_descriptor(dir: &Path) -> bool {
  let Ok(entries) = fs::read_dir(dir) else {
    return false;
  };
  entries.filter_map(Result::ok).any(|entry| {
    entry
      .file_name()
      .to_str()
      .is_some_and(|name| name.ends_with(MODULE_DESCRIPTOR_SUFFIX) || name.ends_with(DEPLOY_DESCRIPTOR_SUFFIX))
  })
}

fn deploy_record(desc: DeployDescriptor, dir: &Path) -> DeployRecord {
  let mut record = DeployRecord::new(desc.name, dir);
  record.includes = desc.includes;
  record.static_libs = desc.static_libs;
  record.dynamic_libs = desc.dynamic_libs;
  record.linker_options = desc.linker_options;
  record.actions = desc.actions;
  record.compiled = desc.compiled;
  record.sources = desc.sources.iter().map(|s| dir.join(s)).collect();
  record
}

/// Files directly inside `dir` with one of `extensions`, sorted by name.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, ScanError> {
  let entries = fs::read_dir(dir).map_err(|source| ScanError::Read {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut files: Vec<PathBuf> = entries
    .filter_map(Result::ok)
    .map(|e| e.path())
    .filter(|p| {
      p.is_file()
        && p
          .extension()
          .and_then(|e| e.to_str())
          .is_some_and(|e| extensions.contains(&e))
    })
    .collect();
  files.sort();
  Ok(files)
}

fn find_named(dir: &Path, stem: &str, extensions: &[&str]) -> Option<PathBuf> {
  extensions
    .iter()
    .map(|ext| dir.join(format!("{stem}.{ext}")))
    .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use super::*;
  use crate::deploy::{DeployError, Deployer};
  use crate::record::Domain;
  use crate::solve::{NoopObserver, Solver};
  use crate::store::{HashStore, Layout, StoredHashes};
  use crate::util::testutil::write_file;
  use tempfile::TempDir;

  #[test]
  fn skips_intermediate_build_and_hidden_dirs() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Source/Core/Core.module.json", r#"{"name": "Core", "module": false}"#);
    write_file(temp.path(), "Intermediate/Stale/Stale.module.json", r#"{"name": "Stale"}"#);
    write_file(temp.path(), "Build/Out/Out.module.json", r#"{"name": "Out"}"#);
    write_file(temp.path(), ".git/Hidden.module.json", r#"{"name": "Hidden"}"#);

    let list = scan_domain(temp.path()).unwrap();

    let names: Vec<&str> = list.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Core"]);
  }

  #[test]
  fn legacy_module_collects_translation_units() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Glue/Glue.module.json", r#"{"name": "Glue", "module": false}"#);
    write_file(temp.path(), "Glue/b.cpp", "int b() { return 2; }");
    write_file(temp.path(), "Glue/a.cpp", "int a() { return 1; }");
    write_file(temp.path(), "Glue/a.h", "int a();");

    let list = scan_domain(temp.path()).unwrap();
    let glue = &list.modules[0];

    assert!(!glue.is_cxx_module);
    assert_eq!(
      glue.sources,
      vec![temp.path().join("Glue/a.cpp"), temp.path().join("Glue/b.cpp")]
    );
  }

  #[test]
  fn rules_name_defaults_to_file_stem() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Game.rules.json", r#"{"finals": ["Game"]}"#);

    let list = scan_domain(temp.path()).unwrap();

    assert_eq!(
      list.rules,
      vec![Rules {
        name: "Game".to_string(),
        finals: vec!["Game".to_string()]
      }]
    );
  }

  #[test]
  fn invalid_descriptor_names_the_file() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "Bad/Bad.module.json", r#"{"imports": []}"#);

    let err = scan_domain(temp.path()).unwrap_err();
    assert!(matches!(err, ScanError::Descriptor { path: ref p, .. } if *p == path));
  }

  #[test]
  fn std_imports_are_not_graph_edges() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Core/Core.module.json", r#"{"name": "Core"}"#);
    write_file(temp.path(), "Core/Core.cppm", "export module Core;\nimport std;\n");

    let list = scan_domain(temp.path()).unwrap();
    assert!(list.modules[0].imports.is_empty());
  }

  #[tokio::test]
  async fn persisted_hash_keeps_root_module_up_to_date() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Game.module.json", r#"{"name": "Game", "module": false}"#);
    write_file(temp.path(), "main.cpp", "int main() { return 0; }");

    let before = scan_domain(temp.path()).unwrap().modules[0].content_hash.clone();

    let store = HashStore::new(Layout::new(temp.path(), None));
    store.persist(Domain::Project, "Game", &before).await.unwrap();
    write_file(temp.path(), "Build/GameDevelopment_Unix_x86_64", "binary");
    write_file(temp.path(), ".cache/index", "scratch");

    let after = scan_domain(temp.path()).unwrap().modules[0].content_hash.clone();

    assert_eq!(before, after);
    assert_eq!(store.stored_hash(Domain::Project, "Game").unwrap(), Some(after));
  }

  #[test]
  fn nested_module_edits_leave_parent_hash_alone() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Core/Core.module.json", r#"{"name": "Core", "module": false}"#);
    write_file(temp.path(), "Core/core.cpp", "int core() { return 1; }");
    write_file(temp.path(), "Core/Math/Math.module.json", r#"{"name": "Math", "module": false}"#);
    write_file(temp.path(), "Core/Math/math.cpp", "int add(int a, int b) { return a + b; }");

    let hashes = |list: &ModuleList| -> Vec<String> { list.modules.iter().map(|m| m.content_hash.clone()).collect() };
    let before = hashes(&scan_domain(temp.path()).unwrap());

    write_file(temp.path(), "Core/Math/math.cpp", "int add(int a, int b) { return b + a; }");
    let after = hashes(&scan_domain(temp.path()).unwrap());

    assert_eq!(before[0], after[0]);
    assert_ne!(before[1], after[1]);
  }

  #[test]
  fn partition_importing_std_still_solves() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "Core/Core.module.json", r#"{"name": "Core"}"#);
    write_file(
      temp.path(),
      "Core/Core.cppm",
      "export module Core;\nexport import :math;\nimport std;\n",
    );
    write_file(temp.path(), "Core/math.cppm", "export module Core:math;\nimport std;\n");

    let list = scan_domain(temp.path()).unwrap();
    assert!(list.modules[0].partitions[0].imports.is_empty());

    let hashes: BTreeMap<String, String> = BTreeMap::new();
    let mut deployer = |_: &DeployRecord, _: Domain| -> Result<(), DeployError> { Ok(()) };
    let deployer: &mut dyn Deployer = &mut deployer;
    let timeline = Solver::new(&hashes, deployer)
      .with_observer(NoopObserver)
      .solve(SolveInput::project(list))
      .unwrap();

    let core = timeline.node("Core").unwrap();
    let order: Vec<Vec<&str>> = core.partition_order.iter().map(|s| s.names()).collect();
    assert_eq!(order, vec![vec!["math"]]);
  }
}
