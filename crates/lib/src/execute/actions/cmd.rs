//! Shell command action used by deploys.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::execute::types::ExecuteError;

/// Runs `cmd` through the shell in `cwd`.
///
/// Deploy commands build third-party code with the user's own tools, so the
/// environment is inherited; `env` entries are layered on top.
///
/// Returns the trimmed stdout on success.
pub async fn execute_cmd(
  cmd: &str,
  env: Option<&BTreeMap<String, String>>,
  cwd: &Path,
  shell: Option<&str>,
) -> Result<String, ExecuteError> {
  info!(cmd = %cmd, cwd = ?cwd, "executing command");

  let (shell_cmd, shell_args) = get_shell(shell);

  let mut command = Command::new(&shell_cmd);
  command.args(&shell_args).arg(cmd).current_dir(cwd);
  if let Some(env) = env {
    command.envs(env);
  }

  let output = command.output().await.map_err(|source| ExecuteError::Spawn {
    program: shell_cmd.clone(),
    source,
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !output.status.success() {
    return Err(ExecuteError::CmdFailed {
      cmd: cmd.to_string(),
      code: output.status.code(),
      stderr,
    });
  }

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command output");
  }

  Ok(stdout)
}

/// Shell command and the flag that passes it a script.
///
/// An explicit `override_shell` picks its flag from the shell's name.
pub(crate) fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd.exe".to_string(), vec!["/C".to_string()])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[cfg(unix)]
  fn echo_env(var: &str) -> String {
    format!("echo ${var}")
  }

  #[cfg(windows)]
  fn echo_env(var: &str) -> String {
    format!("echo %{var}%")
  }

  #[tokio::test]
  async fn returns_trimmed_stdout() {
    let temp = TempDir::new().unwrap();
    let result = execute_cmd("echo hello", None, temp.path(), None).await.unwrap();
    assert_eq!(result, "hello");
  }

  #[tokio::test]
  async fn layers_user_env() {
    let temp = TempDir::new().unwrap();
    let mut env = BTreeMap::new();
    env.insert("BISMUTH_DEPLOY_VAR".to_string(), "zlib".to_string());

    let result = execute_cmd(&echo_env("BISMUTH_DEPLOY_VAR"), Some(&env), temp.path(), None)
      .await
      .unwrap();

    assert_eq!(result, "zlib");
  }

  #[tokio::test]
  async fn failure_captures_exit_code_and_stderr() {
    let temp = TempDir::new().unwrap();
    let result = execute_cmd("echo oops 1>&2 && exit 2", None, temp.path(), None).await;

    match result {
      Err(ExecuteError::CmdFailed { code, stderr, .. }) => {
        assert_eq!(code, Some(2));
        assert_eq!(stderr, "oops");
      }
      other => panic!("expected CmdFailed, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn runs_in_given_directory() {
    let temp = TempDir::new().unwrap();
    execute_cmd("echo x > cwd_marker", None, temp.path(), None).await.unwrap();
    assert!(temp.path().join("cwd_marker").exists());
  }

  #[test]
  fn override_shell_picks_flag() {
    assert_eq!(get_shell(Some("pwsh")).1, vec!["-NoProfile", "-Command"]);
    assert_eq!(get_shell(Some("cmd.exe")).1, vec!["/C"]);
    assert_eq!(get_shell(Some("/bin/bash")).1, vec!["-c"]);
  }
}
