//! Implementation of the `bismuth build` command.

use std::time::Instant;

use anyhow::{Context, Result};

use bismuth_lib::execute::{ExecuteConfig, build_timeline};

use super::{TargetArgs, runtime, solve_target};
use crate::output::{format_duration, print_info, print_stat, print_success};

/// Scans, solves and compiles the project, then links the final targets.
///
/// Stops at the first failing module; hashes of modules that built before
/// the failure stay persisted, so the next run resumes from there.
pub fn cmd_build(args: &TargetArgs, jobs: Option<usize>, dry_run: bool, verbose: bool) -> Result<()> {
  let started = Instant::now();
  let target = args.resolve(verbose)?;
  let rt = runtime()?;

  let timeline = solve_target(&target, args, &rt, !dry_run)?;

  let mut config = ExecuteConfig {
    dry_run,
    ..Default::default()
  };
  if let Some(jobs) = jobs {
    config.parallelism = jobs.max(1);
  }

  let report = rt
    .block_on(build_timeline(&timeline, &target, &config))
    .context("Build failed")?;

  if report.compiled.is_empty() {
    print_info(&format!("{} is up to date", target.name));
  } else {
    print_success(&format!(
      "Built {} ({} {})",
      target.name,
      target.configuration,
      target.target
    ));
  }
  print_stat("Stages", &timeline.stages.len().to_string());
  print_stat("Compiled", &report.compiled.len().to_string());
  print_stat("Up to date", &report.up_to_date.len().to_string());
  if let Some(executable) = &report.executable {
    print_stat("Executable", &executable.display().to_string());
  }
  print_stat("Time", &format_duration(started.elapsed()));

  Ok(())
}
