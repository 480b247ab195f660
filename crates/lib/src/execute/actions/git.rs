//! Repository clone action, driven through the `git` executable.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::info;

use crate::execute::types::ExecuteError;

/// Clones `url` into `<parent>/<repo name>` and optionally checks out `rev`.
///
/// An existing checkout is kept as is apart from the `rev` checkout, so
/// re-running a deploy does not clone twice.
pub async fn git_clone(url: &str, rev: Option<&str>, parent: &Path) -> Result<PathBuf, ExecuteError> {
  tokio::fs::create_dir_all(parent).await?;
  let dest = parent.join(repo_dir_name(url));

  if dest.join(".git").exists() {
    info!(url = %url, dest = ?dest, "repository already cloned");
  } else {
    info!(url = %url, dest = ?dest, "cloning repository");
    run_git(parent, &["clone", url, &dest.to_string_lossy()]).await?;
  }

  if let Some(rev) = rev {
    run_git(&dest, &["checkout", rev]).await?;
  }

  Ok(dest)
}

async fn run_git(cwd: &Path, args: &[&str]) -> Result<(), ExecuteError> {
  let output = Command::new("git")
    .args(args)
    .current_dir(cwd)
    .output()
    .await
    .map_err(|source| ExecuteError::Spawn {
      program: "git".to_string(),
      source,
    })?;

  if !output.status.success() {
    return Err(ExecuteError::CmdFailed {
      cmd: format!("git {}", args.join(" ")),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    });
  }
  Ok(())
}

/// Directory name git would pick for `url`.
fn repo_dir_name(url: &str) -> String {
  let trimmed = url.trim_end_matches('/');
  let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
  let name = last.strip_suffix(".git").unwrap_or(last);
  if name.is_empty() { "repository".to_string() } else { name.to_string() }
}
