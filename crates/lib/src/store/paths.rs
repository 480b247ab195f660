use std::path::{Path, PathBuf};

use crate::consts::{HASH_EXTENSION, INTERMEDIATE_DIR, MODULES_DIR, TEMP_DIR_SUFFIX};
use crate::platform::Platform;
use crate::record::Domain;

/// Locations of persisted build artifacts for both domains.
///
/// ```text
/// <domain root>/Intermediate/Modules/
/// ├── <Name>.hash
/// ├── <Name>.lib | <Name>.a
/// ├── <Name>.pcm | <Name>.ifc
/// └── <Name>_temp/
///     ├── <partition>.pcm | <partition>.ifc
///     ├── <partition>_interface.obj
///     └── <partition>_implementation.obj
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  engine_root: Option<PathBuf>,
  project_root: PathBuf,
}

impl Layout {
  pub fn new(project_root: impl Into<PathBuf>, engine_root: Option<PathBuf>) -> Self {
    Self {
      engine_root,
      project_root: project_root.into(),
    }
  }

  /// Root directory of a domain; engine nodes fall back to the project root
  /// when no engine is configured.
  pub fn domain_root(&self, domain: Domain) -> &Path {
    match (domain, &self.engine_root) {
      (Domain::Engine, Some(root)) => root,
      _ => &self.project_root,
    }
  }

  pub fn modules_dir(&self, domain: Domain) -> PathBuf {
    self.domain_root(domain).join(INTERMEDIATE_DIR).join(MODULES_DIR)
  }

  /// Extension-less base of a module's precompiled interface; the renderer
  /// appends `.pcm` or `.ifc`.
  pub fn precompiled_base(&self, domain: Domain, name: &str) -> PathBuf {
    self.modules_dir(domain).join(name)
  }

  pub fn hash_path(&self, domain: Domain, name: &str) -> PathBuf {
    self.modules_dir(domain).join(format!("{name}.{HASH_EXTENSION}"))
  }

  pub fn library_path(&self, domain: Domain, name: &str, platform: Platform) -> PathBuf {
    self
      .modules_dir(domain)
      .join(format!("{name}.{}", platform.static_lib_extension()))
  }

  pub fn temp_dir(&self, domain: Domain, name: &str) -> PathBuf {
    self.modules_dir(domain).join(format!("{name}{TEMP_DIR_SUFFIX}"))
  }

  /// Directories searched for prebuilt module interfaces, engine first.
  pub fn search_dirs(&self) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if self.engine_root.is_some() {
      dirs.push(self.modules_dir(Domain::Engine));
    }
    dirs.push(self.modules_dir(Domain::Project));
    dirs
  }
}
