//! Persisted per-module state.
//!
//! Each module's content hash is written to `<Name>.hash` next to its
//! library once the module has built successfully. A module whose stored
//! hash matches its current content hash is up to date.

pub mod paths;

use std::collections::BTreeMap;
use std::io;

use tracing::debug;

use crate::record::Domain;

pub use paths::Layout;

/// Read access to previously persisted module hashes.
pub trait StoredHashes {
  /// Returns the stored hash, or `None` when the module was never built.
  fn stored_hash(&self, domain: Domain, name: &str) -> io::Result<Option<String>>;
}

/// In-memory hashes keyed by module name.
impl StoredHashes for BTreeMap<String, String> {
  fn stored_hash(&self, _domain: Domain, name: &str) -> io::Result<Option<String>> {
    Ok(self.get(name).cloned())
  }
}

/// Hash files under each domain's `Intermediate/Modules` directory.
#[derive(Debug, Clone)]
pub struct HashStore {
  layout: Layout,
}

impl HashStore {
  pub fn new(layout: Layout) -> Self {
    Self { layout }
  }

  pub fn layout(&self) -> &Layout {
    &self.layout
  }

  /// Records a successful build of `name`.
  pub async fn persist(&self, domain: Domain, name: &str, hash: &str) -> io::Result<()> {
    tokio::fs::create_dir_all(self.layout.modules_dir(domain)).await?;
    let path = self.layout.hash_path(domain, name);
    tokio::fs::write(&path, hash).await?;
    debug!(module = %name, path = ?path, "persisted module hash");
    Ok(())
  }
}

impl StoredHashes for HashStore {
  fn stored_hash(&self, domain: Domain, name: &str) -> io::Result<Option<String>> {
    match std::fs::read_to_string(self.layout.hash_path(domain, name)) {
      Ok(contents) => Ok(Some(contents.trim().to_string())),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn persisted_hash_reads_back() {
    let temp = TempDir::new().unwrap();
    let store = HashStore::new(Layout::new(temp.path(), None));

    assert_eq!(store.stored_hash(Domain::Project, "Core").unwrap(), None);

    store.persist(Domain::Project, "Core", "abc123").await.unwrap();

    assert_eq!(
      store.stored_hash(Domain::Project, "Core").unwrap(),
      Some("abc123".to_string())
    );
    assert!(temp.path().join("Intermediate/Modules/Core.hash").exists());
  }

  #[test]
  fn trailing_whitespace_is_ignored() {
    let temp = TempDir::new().unwrap();
    let modules = temp.path().join("Intermediate/Modules");
    std::fs::create_dir_all(&modules).unwrap();
    std::fs::write(modules.join("Core.hash"), "abc123\n").unwrap();

    let store = HashStore::new(Layout::new(temp.path(), None));
    assert_eq!(
      store.stored_hash(Domain::Project, "Core").unwrap(),
      Some("abc123".to_string())
    );
  }

  #[test]
  fn engine_hashes_use_engine_root() {
    let project = TempDir::new().unwrap();
    let engine = TempDir::new().unwrap();
    let modules = engine.path().join("Intermediate/Modules");
    std::fs::create_dir_all(&modules).unwrap();
    std::fs::write(modules.join("Core.hash"), "e1").unwrap();

    let store = HashStore::new(Layout::new(project.path(), Some(engine.path().to_path_buf())));
    assert_eq!(store.stored_hash(Domain::Engine, "Core").unwrap(), Some("e1".to_string()));
    assert_eq!(store.stored_hash(Domain::Project, "Core").unwrap(), None);
  }
}
