//! Module declaration scraping for C++20 units.
//!
//! Only the declarations the build needs are recognised: `export module`,
//! `module` and `import`. Line comments are stripped first; block comments
//! and preprocessor conditionals are not evaluated.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::record::PartitionRecord;

static MODULE_DECL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\s*(export\s+)?module\s+([A-Za-z_][\w.]*)\s*(?::\s*([A-Za-z_][\w.]*))?\s*;").unwrap()
});

/// Standard library modules provided by the toolchain, never graph nodes.
pub const STD_MODULES: &[&str] = &["std", "std.compat"];

static IMPORT_DECL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s*(?:export\s+)?import\s+([^;]+?)\s*;").unwrap());

/// Declarations found in one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFacts {
  pub module: Option<String>,
  pub partition: Option<String>,
  pub exported: bool,
  /// Module names, `:partition` names and `<header>` units.
  pub imports: BTreeSet<String>,
}

pub fn scan_unit(text: &str) -> UnitFacts {
  let mut facts = UnitFacts::default();

  for line in text.lines() {
    let line = line.split("//").next().unwrap_or_default();

    if facts.module.is_none()
      && let Some(caps) = MODULE_DECL.captures(line)
    {
      facts.exported = caps.get(1).is_some();
      facts.module = caps.get(2).map(|m| m.as_str().to_string());
      facts.partition = caps.get(3).map(|m| m.as_str().to_string());
      continue;
    }

    if let Some(caps) = IMPORT_DECL.captures(line) {
      facts.imports.insert(normalize_import(&caps[1]));
    }
  }

  facts
}

fn normalize_import(raw: &str) -> String {
  let raw = raw.trim();
  if let Some(rest) = raw.strip_prefix(':') {
    format!(":{}", rest.trim())
  } else if let Some(quoted) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
    format!("<{quoted}>")
  } else {
    raw.to_string()
  }
}

/// Units of one module directory, sorted into primary units and partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleUnits {
  pub interface: Option<PathBuf>,
  pub implementation: Option<PathBuf>,
  pub partitions: Vec<PartitionRecord>,
  /// Whole-module imports declared by any unit of the module.
  pub module_imports: BTreeSet<String>,
}

impl ModuleUnits {
  /// Files a unit for `module`; units of other modules are ignored.
  ///
  /// `std` and `std.compat` imports are dropped from both the module and
  /// its partitions.
  pub fn add_unit(&mut self, module: &str, path: &Path, mut facts: UnitFacts) {
    if facts.module.as_deref() != Some(module) {
      return;
    }

    facts.imports.retain(|i| !STD_MODULES.contains(&i.as_str()));
    self.module_imports.extend(
      facts
        .imports
        .iter()
        .filter(|i| !i.starts_with(':') && !i.starts_with('<'))
        .cloned(),
    );

    match facts.partition {
      Some(name) => {
        let mut record = PartitionRecord::new(name).with_imports(facts.imports);
        if facts.exported {
          record.interface = Some(path.to_path_buf());
        } else {
          record.implementation = Some(path.to_path_buf());
        }
        match self.partitions.iter_mut().find(|p| p.name == record.name) {
          Some(existing) => existing.merge(record),
          None => self.partitions.push(record),
        }
      }
      None if facts.exported => {
        self.interface.get_or_insert_with(|| path.to_path_buf());
      }
      None => {
        self.implementation.get_or_insert_with(|| path.to_path_buf());
      }
    }
  }
}
