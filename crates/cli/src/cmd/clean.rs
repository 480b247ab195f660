//! Implementation of the `bismuth clean` command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use bismuth_lib::config::ProjectFile;
use bismuth_lib::record::Domain;
use bismuth_lib::store::Layout;

use crate::output::{print_info, print_success};

/// Removes `Intermediate/Modules` of the project, and of the engine when
/// `engine` is set. Every module is stale afterwards.
pub fn cmd_clean(project: &Path, engine: bool) -> Result<()> {
  let (root, file) = ProjectFile::locate(project)
    .with_context(|| format!("Failed to resolve project: {}", project.display()))?;
  let engine_root = if engine { file.engine_root(&root)? } else { None };

  let mut domains = vec![Domain::Project];
  if engine_root.is_some() {
    domains.insert(0, Domain::Engine);
  }
  let layout = Layout::new(root, engine_root);

  for domain in domains {
    let dir = layout.modules_dir(domain);
    if !dir.exists() {
      print_info(&format!("Nothing to clean in {}", dir.display()));
      continue;
    }
    fs::remove_dir_all(&dir).with_context(|| format!("Failed to remove {}", dir.display()))?;
    print_success(&format!("Removed {} intermediates: {}", domain, dir.display()));
  }

  Ok(())
}
