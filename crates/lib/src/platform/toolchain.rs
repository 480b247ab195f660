//! Toolchain selection and preflight probing.

use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::PlatformError;
use crate::consts::TOOLCHAIN_ENV;

/// Compiler families with a command renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
  Clang,
  Msvc,
  Emscripten,
}

impl Toolchain {
  /// MSVC on Windows hosts, Clang everywhere else.
  pub fn host_default() -> Self {
    if cfg!(windows) { Self::Msvc } else { Self::Clang }
  }

  /// Reads the toolchain override from `BISMUTH_TOOLCHAIN`, if set.
  pub fn from_env() -> Result<Option<Self>, PlatformError> {
    match std::env::var(TOOLCHAIN_ENV) {
      Ok(value) if !value.trim().is_empty() => value.trim().parse().map(Some),
      _ => Ok(None),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Clang => "clang",
      Self::Msvc => "msvc",
      Self::Emscripten => "emscripten",
    }
  }

  /// Executable of the compiler driver.
  pub fn compiler(&self) -> &'static str {
    match self {
      Self::Clang => "clang++",
      Self::Msvc => "cl.exe",
      Self::Emscripten => "em++",
    }
  }
}

impl fmt::Display for Toolchain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Toolchain {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "clang" | "llvm" => Ok(Self::Clang),
      "msvc" | "cl" => Ok(Self::Msvc),
      "emscripten" | "emcc" | "em++" => Ok(Self::Emscripten),
      _ => Err(PlatformError::UnknownToolchain(s.to_string())),
    }
  }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("{tool} is not installed or not on PATH: {message}")]
  Missing { tool: String, message: String },
}

/// Verifies that the toolchain's compiler driver can be launched.
pub fn check_toolchain(toolchain: Toolchain) -> Result<(), ToolchainError> {
  match toolchain {
    // cl.exe has no version switch; a bare invocation prints the banner and
    // exits non-zero, so only a failed spawn counts as missing
    Toolchain::Msvc => probe(toolchain.compiler(), &[], false),
    Toolchain::Clang | Toolchain::Emscripten => probe(toolchain.compiler(), &["--version"], true),
  }
}

/// Verifies that `git` is available for clone deploy actions.
pub fn check_git() -> Result<(), ToolchainError> {
  probe("git", &["--version"], true)
}

fn probe(tool: &str, args: &[&str], require_success: bool) -> Result<(), ToolchainError> {
  let status = Command::new(tool)
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .map_err(|e| ToolchainError::Missing {
      tool: tool.to_string(),
      message: e.to_string(),
    })?;

  debug!(tool, code = ?status.code(), "probed tool");

  if require_success && !status.success() {
    return Err(ToolchainError::Missing {
      tool: tool.to_string(),
      message: format!("exited with {status}"),
    });
  }

  Ok(())
}
