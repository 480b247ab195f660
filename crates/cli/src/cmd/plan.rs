//! Implementation of the `bismuth plan` command.
//!
//! Solves the module graph without compiling anything. Deploy actions still
//! run because staging a deploy requires it to be prepared.

use anyhow::Result;

use bismuth_lib::config::Target;
use bismuth_lib::execute::{base_driver, needs_build, plan_node};
use bismuth_lib::solve::Timeline;

use super::{TargetArgs, runtime, solve_target};
use crate::output::{print_info, print_json, print_node, print_stage_header, print_stat, print_step, print_success};

pub fn cmd_plan(args: &TargetArgs, commands: bool, json: bool, verbose: bool) -> Result<()> {
  let target = args.resolve(verbose)?;
  let rt = runtime()?;
  let timeline = solve_target(&target, args, &rt, false)?;

  if json {
    return print_json(&timeline_json(&timeline, &target));
  }

  print_success(&format!("Timeline for {} ({})", target.name, target.target));
  print_stat("Stages", &timeline.stages.len().to_string());
  print_stat("Stale", &timeline.stale_modules().count().to_string());

  for (idx, stage) in timeline.stages.iter().enumerate() {
    print_stage_header(idx);
    for node in &stage.nodes {
      let partitions: Vec<Vec<&str>> = node.partition_order.iter().map(|p| p.names()).collect();
      print_node(&node.name, node.kind, node.domain, node.up_to_date, &partitions);
    }
  }

  if !timeline.final_targets.is_empty() {
    println!();
    let finals: Vec<&str> = timeline.final_targets.iter().map(|n| n.name.as_str()).collect();
    print_info(&format!("Final targets: {}", finals.join(", ")));
    print_stat("Executable", &target.executable_path().display().to_string());
  }

  if commands {
    print_commands(&timeline, &target)?;
  }

  Ok(())
}

fn print_commands(timeline: &Timeline, target: &Target) -> Result<()> {
  let layout = target.layout();
  let base = base_driver(target, &layout);

  for node in timeline.nodes() {
    if !needs_build(node, &layout, target.target.platform) {
      continue;
    }
    let plan = plan_node(node, timeline, &base, target, &layout)?;
    println!();
    println!("{}:", plan.module);
    for step in &plan.steps {
      print_step(step);
    }
  }
  Ok(())
}

fn timeline_json(timeline: &Timeline, target: &Target) -> serde_json::Value {
  let stages: Vec<_> = timeline
    .stages
    .iter()
    .map(|stage| {
      let nodes: Vec<_> = stage
        .nodes
        .iter()
        .map(|n| {
          serde_json::json!({
            "name": n.name,
            "kind": n.kind,
            "domain": n.domain,
            "up_to_date": n.up_to_date,
            "depends_on": n.depends_on,
            "partitions": n.partition_order.iter().map(|p| p.names()).collect::<Vec<_>>(),
          })
        })
        .collect();
      serde_json::json!(nodes)
    })
    .collect();

  let finals: Vec<&str> = timeline.final_targets.iter().map(|n| n.name.as_str()).collect();
  serde_json::json!({
    "project": target.name,
    "target": target.target.to_string(),
    "toolchain": target.toolchain,
    "stages": stages,
    "final_targets": finals,
    "executable": target.executable_path(),
  })
}
