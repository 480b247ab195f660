//! Terminal output for bismuth.
//!
//! Status lines, build statistics and the timeline listing printed by
//! `plan`. The `*_line` functions build the plain text; the `print_*`
//! wrappers add colour when the stream supports it.

use std::time::Duration;

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use bismuth_lib::execute::PlannedStep;
use bismuth_lib::record::Domain;
use bismuth_lib::solve::NodeKind;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const MODIFY: &str = "~";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// `Render [module, Engine] stale`
pub fn node_line(name: &str, kind: NodeKind, domain: Domain, up_to_date: bool) -> String {
  let kind = match kind {
    NodeKind::Module => "module",
    NodeKind::Deploy => "deploy",
  };
  let state = if up_to_date { "up to date" } else { "stale" };
  format!("{name} [{kind}, {domain}] {state}")
}

/// `partitions 1: scene, ui`
pub fn partition_line(idx: usize, names: &[&str]) -> String {
  format!("partitions {idx}: {}", names.join(", "))
}

/// `compile interface unit Render`
pub fn step_line(step: &PlannedStep) -> String {
  format!("{} {}", step.kind, step.label)
}

pub fn print_stage_header(idx: usize) {
  println!();
  println!("{}", format!("Stage {idx}:").if_supports_color(Stream::Stdout, |s| s.bold()));
}

/// One timeline node followed by its partition stages.
pub fn print_node(name: &str, kind: NodeKind, domain: Domain, up_to_date: bool, partitions: &[Vec<&str>]) {
  let line = node_line(name, kind, domain, up_to_date);
  if up_to_date {
    println!(
      "  {} {}",
      symbols::INFO.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      line
    );
  } else {
    println!(
      "  {} {}",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      line
    );
  }
  for (idx, names) in partitions.iter().enumerate() {
    println!("      {}", partition_line(idx, names));
  }
}

/// A planned step and the invocations it renders to.
pub fn print_step(step: &PlannedStep) {
  println!(
    "  {} {}",
    symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
    step_line(step)
  );
  for invocation in &step.command.steps {
    println!(
      "      {}",
      invocation.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
