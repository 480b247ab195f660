//! Timeline execution.
//!
//! This module turns a solved `Timeline` into compiled module libraries and
//! the final executable. It handles:
//! - Stage-by-stage ordering (stage N+1 only starts after stage N succeeded)
//! - Parallel compilation of the modules inside one stage
//! - Hash persistence once a module built successfully
//! - Linking the final targets into the executable

pub mod actions;
pub mod types;
pub mod worker;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::Target;
use crate::driver::{CommandDriver, OptimizationLevel};
use crate::platform::Platform;
use crate::solve::{NodeRecord, StagedModuleInfo, Timeline};
use crate::store::{HashStore, Layout};

use actions::{FailureKind, run_invocation};

pub use types::{BuildReport, ExecuteConfig, ExecuteError};
pub use worker::{CompileWorker, ModulePlan, PlannedStep, StepKind};

/// Driver state shared by every step of a target.
pub fn base_driver(target: &Target, layout: &Layout) -> CommandDriver {
  let mut driver = CommandDriver::new(target.target);
  driver
    .add_define(target.target.platform.define())
    .set_optimization(if target.debug {
      OptimizationLevel::Debug
    } else {
      OptimizationLevel::Performance
    })
    .emit_debug_symbols(target.debug);
  for dir in layout.search_dirs() {
    driver.add_precompiled_search_dir(dir);
  }
  driver
}

/// Whether `node` has anything to compile in this run.
///
/// Deploys only compile when they carry sources and their library is
/// missing; they have no content hash.
pub fn needs_build(node: &StagedModuleInfo, layout: &Layout, platform: Platform) -> bool {
  match &node.record {
    NodeRecord::Module(_) => !node.up_to_date,
    NodeRecord::Deploy(d) => {
      d.compiled && !d.sources.is_empty() && !layout.library_path(node.domain, &d.name, platform).exists()
    }
  }
}

/// Plans `node` with every dependency from earlier stages wired in.
pub fn plan_node(
  node: &StagedModuleInfo,
  timeline: &Timeline,
  base: &CommandDriver,
  target: &Target,
  layout: &Layout,
) -> Result<ModulePlan, ExecuteError> {
  let mut worker = CompileWorker::new(node, base, target.toolchain, layout);
  for name in &node.depends_on {
    let dependency = timeline.node(name).ok_or_else(|| ExecuteError::DependencyNotBuilt {
      module: node.name.clone(),
      dependency: name.clone(),
    })?;
    worker.add_dependency(dependency);
  }
  worker.plan()
}

/// Runs every step of `plan` in order, then persists its hash.
///
/// The first failing step aborts the module and nothing is persisted.
pub async fn run_plan(plan: &ModulePlan, store: &HashStore, dry_run: bool) -> Result<(), ExecuteError> {
  if dry_run {
    for step in &plan.steps {
      info!(module = %plan.module, step = %step.kind, label = %step.label, cmd = %step.command, "dry run");
    }
    return Ok(());
  }

  tokio::fs::create_dir_all(&plan.temp_dir).await?;

  for step in &plan.steps {
    debug!(module = %plan.module, step = %step.kind, label = %step.label, "running step");
    let kind = if step.kind.is_link() {
      FailureKind::Link
    } else {
      FailureKind::Compile
    };
    for invocation in &step.command.steps {
      run_invocation(invocation, &plan.module, kind).await?;
    }
  }

  if let Some(hash) = &plan.hash {
    store.persist(plan.domain, &plan.module, hash).await?;
  }
  Ok(())
}

/// Builds every stale node of `timeline` and links the executable.
///
/// Modules of one stage compile concurrently, bounded by
/// `config.parallelism`. When a module fails, its siblings still finish but
/// no later stage starts.
pub async fn build_timeline(
  timeline: &Timeline,
  target: &Target,
  config: &ExecuteConfig,
) -> Result<BuildReport, ExecuteError> {
  let layout = target.layout();
  let base = base_driver(target, &layout);

  let mut report = run_stages(timeline, &layout, target.target.platform, config, |node| {
    plan_node(node, timeline, &base, target, &layout)
  })
  .await?;

  report.executable = link_executable(timeline, target, &base, &layout, &report, config.dry_run).await?;

  info!(
    compiled = report.compiled.len(),
    up_to_date = report.up_to_date.len(),
    "build complete"
  );
  Ok(report)
}

/// Plans and runs the stale nodes of each stage in order.
///
/// Planning of stage N+1 only happens once every plan of stage N succeeded.
async fn run_stages<F>(
  timeline: &Timeline,
  layout: &Layout,
  platform: Platform,
  config: &ExecuteConfig,
  mut plan: F,
) -> Result<BuildReport, ExecuteError>
where
  F: FnMut(&StagedModuleInfo) -> Result<ModulePlan, ExecuteError>,
{
  let store = Arc::new(HashStore::new(layout.clone()));
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut report = BuildReport::default();

  info!(
    stages = timeline.stages.len(),
    parallelism = config.parallelism,
    dry_run = config.dry_run,
    "starting build"
  );

  for (stage_idx, stage) in timeline.stages.iter().enumerate() {
    let mut plans = Vec::new();
    for node in &stage.nodes {
      if needs_build(node, layout, platform) {
        plans.push(plan(node)?);
        report.compiled.push(node.name.clone());
      } else if node.module().is_some() {
        report.up_to_date.push(node.name.clone());
      }
    }

    if plans.is_empty() {
      debug!(stage = stage_idx, "stage up to date");
      continue;
    }

    info!(stage = stage_idx, modules = plans.len(), "compiling stage");
    execute_stage(plans, &store, semaphore.clone(), config.dry_run).await?;
  }

  Ok(report)
}

/// Runs one stage's plans in parallel and reports the first failure once
/// every sibling has finished.
async fn execute_stage(
  plans: Vec<ModulePlan>,
  store: &Arc<HashStore>,
  semaphore: Arc<Semaphore>,
  dry_run: bool,
) -> Result<(), ExecuteError> {
  let mut join_set = JoinSet::new();

  for plan in plans {
    let store = store.clone();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      // Acquire semaphore permit inside the task
      let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| ExecuteError::TaskFailed(e.to_string()))?;
      run_plan(&plan, &store, dry_run).await?;
      Ok::<_, ExecuteError>(plan.module)
    });
  }

  let mut first_error = None;
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(Ok(module)) => info!(module = %module, "module built"),
      Ok(Err(e)) => {
        error!(error = %e, "module failed");
        first_error.get_or_insert(e);
      }
      Err(e) => {
        error!(error = %e, "compile task panicked");
        first_error.get_or_insert(ExecuteError::TaskFailed(e.to_string()));
      }
    }
  }

  match first_error {
    Some(e) => Err(e),
    None => Ok(()),
  }
}

/// Names of the final targets and everything they depend on, transitively.
fn final_closure(timeline: &Timeline) -> HashSet<&str> {
  let mut closure = HashSet::new();
  let mut queue: Vec<&str> = timeline.final_targets.iter().map(|n| n.name.as_str()).collect();
  while let Some(name) = queue.pop() {
    if !closure.insert(name) {
      continue;
    }
    if let Some(node) = timeline.node(name) {
      queue.extend(node.depends_on.iter().map(String::as_str));
    }
  }
  closure
}

/// Links the final targets' libraries into the executable.
///
/// Libraries are passed dependents first so single-pass linkers resolve
/// every symbol. Returns `None` when the timeline has no final targets.
async fn link_executable(
  timeline: &Timeline,
  target: &Target,
  base: &CommandDriver,
  layout: &Layout,
  report: &BuildReport,
  dry_run: bool,
) -> Result<Option<PathBuf>, ExecuteError> {
  if timeline.final_targets.is_empty() {
    info!("no final targets, skipping link");
    return Ok(None);
  }

  let executable = target.executable_path();
  if report.compiled.is_empty() && executable.exists() {
    info!(executable = ?executable, "executable up to date");
    return Ok(Some(executable));
  }

  let closure = final_closure(timeline);
  let platform = target.target.platform;
  let mut link = base.clone();
  link.set_compile(false).set_object_output(&executable);

  let mut dynamic_libs = BTreeSet::new();
  for stage in timeline.stages.iter().rev() {
    for node in stage.nodes.iter().filter(|n| closure.contains(n.name.as_str())) {
      match &node.record {
        NodeRecord::Module(m) => {
          link.add_object(layout.library_path(node.domain, &m.name, platform));
        }
        NodeRecord::Deploy(d) => {
          if d.compiled && !d.sources.is_empty() {
            link.add_object(layout.library_path(node.domain, &d.name, platform));
          }
          for lib in d.static_lib_paths() {
            link.add_object(lib);
          }
          dynamic_libs.extend(d.dynamic_lib_paths());
        }
      }
      for option in node.record.linker_options() {
        link.add_link_option(option.clone());
      }
    }
  }

  let command = link.render(target.toolchain)?;
  if dry_run {
    info!(executable = ?executable, cmd = %command, "dry run");
    return Ok(Some(executable));
  }

  tokio::fs::create_dir_all(&target.output_path).await?;
  for invocation in &command.steps {
    run_invocation(invocation, &target.name, FailureKind::Link).await?;
  }
  copy_dynamic_libs(&dynamic_libs, &target.output_path).await?;

  info!(executable = ?executable, "linked executable");
  Ok(Some(executable))
}

/// Places shared libraries of deploys next to the executable.
async fn copy_dynamic_libs(libs: &BTreeSet<PathBuf>, output: &Path) -> Result<(), ExecuteError> {
  for lib in libs {
    let Some(file_name) = lib.file_name() else {
      continue;
    };
    tokio::fs::copy(lib, output.join(file_name)).await?;
    debug!(lib = ?lib, "copied dynamic library");
  }
  Ok(())
}
