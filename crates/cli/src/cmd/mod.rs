mod build;
mod clean;
mod info;
mod plan;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::runtime::Runtime;
use tracing::info;

use bismuth_lib::config::{Target, TargetOverrides};
use bismuth_lib::deploy::ActionDeployer;
use bismuth_lib::platform::{Arch, Platform, Toolchain, check_git, check_toolchain};
use bismuth_lib::scan::load_target;
use bismuth_lib::solve::{Solver, Timeline};
use bismuth_lib::store::HashStore;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use info::cmd_info;
pub use plan::cmd_plan;

/// Options selecting the project and the platform it is built for.
#[derive(Debug, Args)]
pub struct TargetArgs {
  /// Project directory or project file
  #[arg(default_value = ".")]
  pub project: PathBuf,

  /// Target platform (Win32, Mach, Unix, WebASM)
  #[arg(long)]
  pub platform: Option<Platform>,

  /// Target architecture (x86_32, x86_64, ARM_32, ARM_64)
  #[arg(long)]
  pub arch: Option<Arch>,

  /// Compiler family (clang, msvc, emscripten)
  #[arg(long)]
  pub toolchain: Option<Toolchain>,

  /// Configuration name baked into the executable name
  #[arg(long)]
  pub configuration: Option<String>,

  /// Build with debug symbols and no optimization
  #[arg(long)]
  pub debug: bool,

  /// Directory receiving the executable
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Ignore the engine named by the project file
  #[arg(long)]
  pub no_engine: bool,

  /// Shell running deploy `cmd` actions
  #[arg(long)]
  pub shell: Option<String>,
}

impl TargetArgs {
  pub fn resolve(&self, verbose: bool) -> Result<Target> {
    let overrides = TargetOverrides {
      platform: self.platform,
      arch: self.arch,
      toolchain: self.toolchain,
      configuration: self.configuration.clone(),
      output: self.output.clone(),
      debug: self.debug,
      verbose,
      no_engine: self.no_engine,
    };
    Target::resolve(&self.project, &overrides)
      .with_context(|| format!("Failed to resolve project: {}", self.project.display()))
  }
}

/// Scans both domains and stages them; deploy actions run on `rt`.
///
/// With `check_compiler` the toolchain is probed before the graph is touched.
pub fn solve_target(target: &Target, args: &TargetArgs, rt: &Runtime, check_compiler: bool) -> Result<Timeline> {
  let input = load_target(target).context("Failed to scan sources")?;

  if check_compiler {
    check_toolchain(target.toolchain)?;
  }
  if input.needs_git() {
    check_git()?;
  }

  info!(
    project = %target.name,
    target = %target.target,
    toolchain = %target.toolchain,
    engine = target.include_engine,
    "solving"
  );

  let store = HashStore::new(target.layout());
  let mut deployer = ActionDeployer::new(rt.handle().clone()).with_shell(args.shell.clone());
  let timeline = Solver::new(&store, &mut deployer)
    .solve(input)
    .context("Failed to solve module graph")?;
  Ok(timeline)
}

pub fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}
