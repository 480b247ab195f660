//! Deploy actions: preparation steps for third-party packages.
//!
//! A deploy's actions run exactly once per solve, while the solver stages
//! the deploy and before anything that depends on it is staged. They run in
//! the deploy's own directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::consts::DEPLOY_DIR;
use crate::execute::actions::{execute_cmd, execute_fetch, git_clone};
use crate::execute::types::ExecuteError;
use crate::record::{DeployRecord, Domain};

/// One preparation step declared in a deploy descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployAction {
  /// Download a file into `downloads/`, verifying its SHA-256.
  FetchUrl { url: String, sha256: String },
  /// Clone a repository into `Deploy/`, optionally checking out `rev`.
  GitClone {
    url: String,
    #[serde(default)]
    rev: Option<String>,
  },
  /// Run a shell command.
  Cmd {
    cmd: String,
    #[serde(default)]
    env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    cwd: Option<String>,
  },
  CreateDir { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum DeployError {
  #[error("action {index} of deploy {deploy} failed: {source}")]
  Action {
    deploy: String,
    index: usize,
    #[source]
    source: ExecuteError,
  },
}

/// Runs a deploy's preparation actions on behalf of the solver.
pub trait Deployer {
  fn deploy(&mut self, record: &DeployRecord, domain: Domain) -> Result<(), DeployError>;
}

impl<F> Deployer for F
where
  F: FnMut(&DeployRecord, Domain) -> Result<(), DeployError>,
{
  fn deploy(&mut self, record: &DeployRecord, domain: Domain) -> Result<(), DeployError> {
    self(record, domain)
  }
}

/// `Deployer` that executes the declared actions.
///
/// The solver is synchronous, so each deploy blocks on the runtime behind
/// `handle`. Must not be used from inside that runtime's async context.
#[derive(Debug, Clone)]
pub struct ActionDeployer {
  handle: Handle,
  shell: Option<String>,
}

impl ActionDeployer {
  pub fn new(handle: Handle) -> Self {
    Self { handle, shell: None }
  }

  pub fn with_shell(mut self, shell: Option<String>) -> Self {
    self.shell = shell;
    self
  }
}

impl Deployer for ActionDeployer {
  fn deploy(&mut self, record: &DeployRecord, domain: Domain) -> Result<(), DeployError> {
    info!(deploy = %record.name, %domain, actions = record.actions.len(), "running deploy actions");
    self.handle.block_on(run_deploy_actions(record, self.shell.as_deref()))
  }
}

/// Runs every action of `record` in order, stopping at the first failure.
pub async fn run_deploy_actions(record: &DeployRecord, shell: Option<&str>) -> Result<(), DeployError> {
  for (index, action) in record.actions.iter().enumerate() {
    debug!(deploy = %record.name, index, ?action, "deploy action");
    run_action(action, &record.path, shell)
      .await
      .map_err(|source| DeployError::Action {
        deploy: record.name.clone(),
        index,
        source,
      })?;
  }
  Ok(())
}

async fn run_action(action: &DeployAction, deploy_dir: &Path, shell: Option<&str>) -> Result<(), ExecuteError> {
  match action {
    DeployAction::FetchUrl { url, sha256 } => {
      execute_fetch(url, sha256, deploy_dir).await?;
    }
    DeployAction::GitClone { url, rev } => {
      git_clone(url, rev.as_deref(), &deploy_dir.join(DEPLOY_DIR)).await?;
    }
    DeployAction::Cmd { cmd, env, cwd } => {
      let working_dir = cwd.as_ref().map(|c| deploy_dir.join(c));
      execute_cmd(cmd, env.as_ref(), working_dir.as_deref().unwrap_or(deploy_dir), shell).await?;
    }
    DeployAction::CreateDir { path } => {
      tokio::fs::create_dir_all(deploy_dir.join(path)).await?;
    }
  }
  Ok(())
}
