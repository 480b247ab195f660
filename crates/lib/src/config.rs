//! Build target configuration.
//!
//! A `Target` is assembled from, highest precedence first: explicit
//! overrides (CLI flags), the environment (`BISMUTH_TOOLCHAIN`), the
//! `.bismuth` project file and host detection.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{BUILD_DIR, DEFAULT_CONFIGURATION, PROJECT_FILE_SUFFIX};
use crate::platform::{Arch, Platform, PlatformError, TargetPlatform, Toolchain};
use crate::store::Layout;

/// Contents of a `<Name>.bismuth` project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectFile {
  pub name: String,
  /// Engine root, relative to the project root unless absolute.
  #[serde(default)]
  pub engine_path: Option<PathBuf>,
  #[serde(default)]
  pub configuration: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no .bismuth project file found in {0}")]
  ProjectFileMissing(PathBuf),

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid project file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("engine path {0} does not exist")]
  EngineMissing(PathBuf),

  #[error(transparent)]
  Platform(#[from] PlatformError),
}

impl ProjectFile {
  /// Finds and parses the project file.
  ///
  /// `path` is either the project file itself or the directory holding it.
  /// Returns the project root along with the parsed file.
  pub fn locate(path: &Path) -> Result<(PathBuf, Self), ConfigError> {
    let path = dunce::canonicalize(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let (root, file) = if path.is_file() {
      let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
      (root, path)
    } else {
      let file = find_project_file(&path)?;
      (path, file)
    };

    let contents = fs::read_to_string(&file).map_err(|source| ConfigError::Read {
      path: file.clone(),
      source,
    })?;
    let parsed: ProjectFile = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
      path: file.clone(),
      source,
    })?;

    debug!(project = %parsed.name, file = ?file, "loaded project file");
    Ok((root, parsed))
  }

  /// Canonical engine root, if the project names one.
  pub fn engine_root(&self, project_root: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let Some(engine) = &self.engine_path else {
      return Ok(None);
    };
    let joined = if engine.is_absolute() { engine.clone() } else { project_root.join(engine) };
    dunce::canonicalize(&joined)
      .map(Some)
      .map_err(|_| ConfigError::EngineMissing(joined))
  }
}

fn find_project_file(dir: &Path) -> Result<PathBuf, ConfigError> {
  let entries = fs::read_dir(dir).map_err(|source| ConfigError::Read {
    path: dir.to_path_buf(),
    source,
  })?;

  let mut candidates: Vec<PathBuf> = entries
    .filter_map(Result::ok)
    .map(|e| e.path())
    .filter(|p| {
      p.is_file()
        && p
          .file_name()
          .and_then(|n| n.to_str())
          .is_some_and(|n| n.ends_with(PROJECT_FILE_SUFFIX))
    })
    .collect();
  candidates.sort();

  candidates
    .into_iter()
    .next()
    .ok_or_else(|| ConfigError::ProjectFileMissing(dir.to_path_buf()))
}

/// Explicit settings that win over everything else.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
  pub platform: Option<Platform>,
  pub arch: Option<Arch>,
  pub toolchain: Option<Toolchain>,
  pub configuration: Option<String>,
  pub output: Option<PathBuf>,
  pub debug: bool,
  pub verbose: bool,
  /// Build the project alone even when it names an engine.
  pub no_engine: bool,
}

/// Fully resolved description of what to build and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub name: String,
  pub configuration: String,
  pub target: TargetPlatform,
  pub toolchain: Toolchain,
  pub include_engine: bool,
  pub engine_path: Option<PathBuf>,
  pub project_path: PathBuf,
  pub output_path: PathBuf,
  pub debug: bool,
  pub verbose: bool,
}

impl Target {
  /// Resolves the target for the project at `project`.
  pub fn resolve(project: &Path, overrides: &TargetOverrides) -> Result<Self, ConfigError> {
    let (project_path, file) = ProjectFile::locate(project)?;

    let host = TargetPlatform::current();
    let platform = match overrides.platform {
      Some(p) => p,
      None => host.map(|h| h.platform).ok_or(PlatformError::UnsupportedHost)?,
    };
    let arch = match overrides.arch {
      Some(a) => a,
      None => host.map(|h| h.arch).ok_or(PlatformError::UnsupportedHost)?,
    };

    let toolchain = match overrides.toolchain {
      Some(t) => t,
      None => Toolchain::from_env()?.unwrap_or_else(Toolchain::host_default),
    };

    let engine_path = if overrides.no_engine {
      None
    } else {
      file.engine_root(&project_path)?
    };

    let configuration = overrides
      .configuration
      .clone()
      .or(file.configuration)
      .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string());

    let output_path = overrides
      .output
      .clone()
      .unwrap_or_else(|| project_path.join(BUILD_DIR));

    Ok(Self {
      name: file.name,
      configuration,
      target: TargetPlatform::new(platform, arch),
      toolchain,
      include_engine: engine_path.is_some(),
      engine_path,
      project_path,
      output_path,
      debug: overrides.debug,
      verbose: overrides.verbose,
    })
  }

  pub fn layout(&self) -> Layout {
    Layout::new(self.project_path.clone(), self.engine_path.clone())
  }

  /// `<output>/<Name><Configuration>_<Platform>_<Arch>[.ext]`
  pub fn executable_path(&self) -> PathBuf {
    let stem = format!("{}{}_{}", self.name, self.configuration, self.target);
    let file = match self.target.platform.executable_extension() {
      Some(ext) => format!("{stem}.{ext}"),
      None => stem,
    };
    self.output_path.join(file)
  }
}
