mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::TargetArgs;
use output::print_error;

/// Dependency-staged builds for C++20 module projects
#[derive(Parser)]
#[command(name = "bismuth")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile stale modules and link the final targets
  Build {
    #[command(flatten)]
    target: TargetArgs,

    /// Maximum number of modules compiled at once
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log every step instead of running it
    #[arg(long)]
    dry_run: bool,
  },

  /// Solve the module graph and print the timeline
  Plan {
    #[command(flatten)]
    target: TargetArgs,

    /// Print the rendered steps of every stale module
    #[arg(long)]
    commands: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Remove persisted intermediates
  Clean {
    /// Project directory or project file
    #[arg(default_value = ".")]
    project: std::path::PathBuf,

    /// Also clean the engine's intermediates
    #[arg(long)]
    engine: bool,
  },

  /// Show host platform and toolchain
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build { target, jobs, dry_run } => cmd::cmd_build(&target, jobs, dry_run, cli.verbose),
    Commands::Plan { target, commands, json } => cmd::cmd_plan(&target, commands, json, cli.verbose),
    Commands::Clean { project, engine } => cmd::cmd_clean(&project, engine),
    Commands::Info => cmd::cmd_info(),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
