//! Runs rendered compiler and linker invocations.

use tokio::process::Command;
use tracing::{debug, warn};

use crate::driver::Invocation;
use crate::execute::types::ExecuteError;

/// How a failing invocation is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
  Compile,
  Link,
}

/// Spawns `invocation` and waits for it.
///
/// Toolchain chatter on stdout is logged at debug level; warnings printed on
/// stderr by a successful step are surfaced as `warn!`.
pub async fn run_invocation(invocation: &Invocation, module: &str, kind: FailureKind) -> Result<(), ExecuteError> {
  debug!(module = %module, cmd = %invocation, "running");

  let output = Command::new(&invocation.program)
    .args(&invocation.args)
    .output()
    .await
    .map_err(|source| ExecuteError::Spawn {
      program: invocation.program.clone(),
      source,
    })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !stdout.trim().is_empty() {
    debug!(module = %module, stdout = %stdout.trim(), "tool output");
  }

  if !output.status.success() {
    let (module, cmd, code) = (module.to_string(), invocation.to_string(), output.status.code());
    return Err(match kind {
      FailureKind::Compile => ExecuteError::CompileFailed {
        module,
        cmd,
        code,
        stderr,
      },
      FailureKind::Link => ExecuteError::LinkFailed {
        module,
        cmd,
        code,
        stderr,
      },
    });
  }

  if !stderr.is_empty() {
    warn!(module = %module, "{stderr}");
  }

  Ok(())
}
