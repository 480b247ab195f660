//! Types for module compilation.
//!
//! Error, report and configuration types shared by the orchestrator, the
//! per-module worker and the low-level actions.

use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;

/// Errors that can occur while building a timeline.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// HTTP request failed during a `fetch_url` action.
  #[error("fetch failed for {url}: {message}")]
  FetchFailed { url: String, message: String },

  /// SHA256 hash mismatch after download.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  /// Shell command or helper tool exited with a failure.
  #[error("command failed with exit code {code:?}: {cmd}\n{stderr}")]
  CmdFailed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The program could not be started at all.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("compilation of {module} failed with exit code {code:?}: {cmd}\n{stderr}")]
  CompileFailed {
    module: String,
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error("linking {module} failed with exit code {code:?}: {cmd}\n{stderr}")]
  LinkFailed {
    module: String,
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  #[error(transparent)]
  Driver(#[from] DriverError),

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// A dependency named by a module is missing from earlier stages.
  #[error("module {module} depends on {dependency}, which was not staged before it")]
  DependencyNotBuilt { module: String, dependency: String },

  /// A C++20 module has no primary interface unit to compile.
  #[error("module {module} has no primary interface unit")]
  MissingInterfaceUnit { module: String },

  /// A compile task panicked or was cancelled.
  #[error("compile task failed: {0}")]
  TaskFailed(String),
}

/// Outcome of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
  /// Modules compiled in this run, in stage order.
  pub compiled: Vec<String>,
  /// Modules whose stored hash was current.
  pub up_to_date: Vec<String>,
  /// The linked executable, when final targets exist.
  pub executable: Option<PathBuf>,
}

impl BuildReport {
  pub fn total(&self) -> usize {
    self.compiled.len() + self.up_to_date.len()
  }
}

/// Configuration for build execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of modules compiled in parallel.
  pub parallelism: usize,

  /// Render and log every step without spawning anything.
  pub dry_run: bool,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      dry_run: false,
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
