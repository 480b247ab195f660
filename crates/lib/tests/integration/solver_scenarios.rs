//! End-to-end staging scenarios for `Solver` and `SubModuleSolver`.

use std::collections::BTreeMap;

use bismuth_lib::deploy::DeployAction;
use bismuth_lib::driver::CommandDriver;
use bismuth_lib::platform::{Arch, Platform, TargetPlatform, Toolchain};
use bismuth_lib::record::{DeployRecord, Domain, ModuleList, ModuleRecord, Rules};
use bismuth_lib::solve::{CycleScope, SolveError, SolveInput, SubModuleSolver};

use super::common::{EventLog, module, partition, solve, solve_logged};

fn rules(finals: &[&str]) -> Rules {
  Rules {
    name: "Rules".to_string(),
    finals: finals.iter().map(|f| f.to_string()).collect(),
  }
}

fn chain() -> ModuleList {
  ModuleList {
    modules: vec![
      module("Game", &["Render"]),
      module("Render", &["Core"]),
      module("Core", &[]),
    ],
    rules: vec![rules(&["Game"])],
    ..Default::default()
  }
}

fn all_current(list: &ModuleList) -> BTreeMap<String, String> {
  list
    .modules
    .iter()
    .map(|m| (m.name.clone(), m.content_hash.clone()))
    .collect()
}

#[test]
fn linear_chain_stages_one_module_per_stage() {
  let timeline = solve(SolveInput::project(chain()), &BTreeMap::new()).unwrap();

  assert_eq!(timeline.stage_names(), vec![vec!["Core"], vec!["Render"], vec!["Game"]]);
  let finals: Vec<&str> = timeline.final_targets.iter().map(|n| n.name.as_str()).collect();
  assert_eq!(finals, vec!["Game"]);
}

#[test]
fn stale_dependency_marks_dependents_stale() {
  let list = ModuleList {
    modules: vec![module("Core", &[]), module("Render", &["Core"])],
    ..Default::default()
  };
  let mut hashes = BTreeMap::new();
  hashes.insert("Core".to_string(), "Core-v1".to_string());
  hashes.insert("Render".to_string(), "Render-v0".to_string());

  let timeline = solve(SolveInput::project(list), &hashes).unwrap();

  assert!(timeline.node("Core").unwrap().up_to_date);
  assert!(!timeline.node("Render").unwrap().up_to_date);
}

#[test]
fn staleness_propagates_through_current_modules() {
  let list = chain();
  let mut hashes = all_current(&list);
  hashes.insert("Core".to_string(), "Core-v0".to_string());

  let log = EventLog::default();
  let timeline = solve_logged(SolveInput::project(list), &hashes, &log).unwrap();

  assert!(timeline.nodes().all(|n| !n.up_to_date));
  let stale: Vec<String> = log.borrow().iter().filter(|e| e.starts_with("stale:")).cloned().collect();
  assert_eq!(stale, vec!["stale:Core", "stale:Render", "stale:Game"]);
}

#[test]
fn unchanged_graph_is_fully_up_to_date() {
  let list = chain();
  let hashes = all_current(&list);

  let timeline = solve(SolveInput::project(list), &hashes).unwrap();

  assert_eq!(timeline.stale_modules().count(), 0);
}

#[test]
fn partition_chain_stages_by_imports() {
  let m = ModuleRecord::new("M", "/src/M")
    .with_partition(partition("c", &[":a", ":b"]))
    .with_partition(partition("b", &[":a"]))
    .with_partition(partition("a", &[]));

  let stages = SubModuleSolver::new(&m, Domain::Project).solve().unwrap();

  let names: Vec<Vec<&str>> = stages.iter().map(|s| s.names()).collect();
  assert_eq!(names, vec![vec!["a"], vec!["b"], vec!["c"]]);
}

#[test]
fn deploy_runs_before_its_dependent_is_staged() {
  let deploy = DeployRecord::new("ThirdParty", "/src/ThirdParty").with_action(DeployAction::CreateDir {
    path: "include".into(),
  });
  let list = ModuleList {
    modules: vec![module("Game", &["ThirdParty"])],
    deploys: vec![deploy],
    ..Default::default()
  };

  let log = EventLog::default();
  let timeline = solve_logged(SolveInput::project(list), &BTreeMap::new(), &log).unwrap();

  assert_eq!(timeline.stage_names(), vec![vec!["ThirdParty"], vec!["Game"]]);
  let events: Vec<String> = log.borrow().iter().filter(|e| !e.starts_with("stale:")).cloned().collect();
  assert_eq!(events, vec!["deploy:ThirdParty", "staged:ThirdParty", "staged:Game"]);
}

#[test]
fn every_dependency_sits_in_an_earlier_stage() {
  let list = ModuleList {
    modules: vec![
      module("App", &["Ui", "Net"]),
      module("Ui", &["Core", "Math"]),
      module("Net", &["Core"]),
      module("Math", &[]),
      module("Core", &["Math"]),
    ],
    ..Default::default()
  };

  let timeline = solve(SolveInput::project(list), &BTreeMap::new()).unwrap();

  for node in timeline.nodes() {
    let own = timeline.stage_of(&node.name).unwrap();
    for dep in &node.depends_on {
      assert!(timeline.stage_of(dep).unwrap() < own, "{dep} must precede {}", node.name);
    }
  }
}

#[test]
fn module_cycle_names_both_modules() {
  let list = ModuleList {
    modules: vec![module("X", &["Y"]), module("Y", &["X"]), module("Free", &[])],
    ..Default::default()
  };

  let err = solve(SolveInput::project(list), &BTreeMap::new()).unwrap_err();

  match err {
    SolveError::CircularDependency { scope, stuck, cycles } => {
      assert_eq!(scope, CycleScope::Modules);
      let names: Vec<&str> = stuck.iter().map(|s| s.node.as_str()).collect();
      assert_eq!(names, vec!["X", "Y"]);
      assert_eq!(cycles.len(), 1);
      assert!(cycles[0].contains(&"X".to_string()) && cycles[0].contains(&"Y".to_string()));
    }
    other => panic!("expected a circular dependency, got {other}"),
  }
}

#[test]
fn partition_cycle_is_reported_for_its_module() {
  let m = ModuleRecord::new("M", "/src/M")
    .with_partition(partition("p1", &[":p2"]))
    .with_partition(partition("p2", &[":p1"]));

  let err = SubModuleSolver::new(&m, Domain::Project).solve().unwrap_err();

  assert!(matches!(
    err,
    SolveError::CircularDependency { scope: CycleScope::Partitions { ref module }, .. } if module == "M"
  ));
}

#[test]
fn partition_cycle_fails_the_whole_solve() {
  let mut m = module("M", &[]);
  m.add_partition(partition("p1", &[":p2"]));
  m.add_partition(partition("p2", &[":p1"]));
  let list = ModuleList {
    modules: vec![m],
    ..Default::default()
  };

  let err = solve(SolveInput::project(list), &BTreeMap::new()).unwrap_err();
  assert!(matches!(err, SolveError::CircularDependency { scope: CycleScope::Partitions { .. }, .. }));
}

#[test]
fn repeated_includes_render_once() {
  let mut driver = CommandDriver::new(TargetPlatform::new(Platform::Unix, Arch::X86_64));
  driver
    .set_source("/src/Core/a.cpp")
    .set_object_output("/out/a.obj")
    .add_include("/src/Core/include")
    .add_include("/src/Core/include");

  let rendered = driver.render(Toolchain::Clang).unwrap().to_string();

  assert_eq!(rendered.matches("-I/src/Core/include").count(), 1);
}

#[test]
fn branching_a_driver_leaves_the_parent_untouched() {
  let mut parent = CommandDriver::new(TargetPlatform::new(Platform::Win32, Arch::X86_64));
  parent.add_define("PLATFORM_WINDOWS").add_include("/src/Core");

  let mut branch = parent.clone();
  branch.add_define("EXTRA").wipe_includes().add_object("/out/x.obj");

  assert_eq!(parent.defines(), ["PLATFORM_WINDOWS".to_string()]);
  assert_eq!(parent.includes().len(), 1);
  assert!(parent.objects().is_empty());
  assert_eq!(branch.defines().len(), 2);
}

#[test]
fn missing_final_target_is_reported() {
  let list = ModuleList {
    modules: vec![module("Core", &[])],
    rules: vec![rules(&["App"])],
    ..Default::default()
  };

  let err = solve(SolveInput::project(list), &BTreeMap::new()).unwrap_err();

  assert!(matches!(err, SolveError::UnresolvedFinalTarget { ref names } if names == &["App".to_string()]));
}

#[test]
fn solving_twice_gives_identical_timelines() {
  let list = ModuleList {
    modules: vec![
      module("B", &[]),
      module("A", &[]),
      module("D", &["A", "B"]),
      module("C", &["A"]),
    ],
    ..Default::default()
  };

  let first = solve(SolveInput::project(list.clone()), &BTreeMap::new()).unwrap();
  let second = solve(SolveInput::project(list), &BTreeMap::new()).unwrap();

  assert_eq!(first.stage_names(), second.stage_names());
  assert_eq!(first.stage_names(), vec![vec!["B", "A"], vec!["D", "C"]]);
}

#[test]
fn project_modules_import_engine_modules() {
  let engine = ModuleList {
    modules: vec![module("Core", &[])],
    ..Default::default()
  };
  let project = ModuleList {
    modules: vec![module("Game", &["Core"])],
    rules: vec![rules(&["Game"])],
    ..Default::default()
  };

  let timeline = solve(SolveInput::project(project).with_engine(engine), &BTreeMap::new()).unwrap();

  assert_eq!(timeline.node("Core").unwrap().domain, Domain::Engine);
  assert_eq!(timeline.node("Game").unwrap().domain, Domain::Project);
  assert_eq!(timeline.stage_names(), vec![vec!["Core"], vec!["Game"]]);
}

#[test]
fn duplicate_names_across_domains_are_rejected() {
  let engine = ModuleList {
    modules: vec![module("Core", &[])],
    ..Default::default()
  };
  let project = ModuleList {
    modules: vec![module("Core", &[])],
    ..Default::default()
  };

  let err = solve(SolveInput::project(project).with_engine(engine), &BTreeMap::new()).unwrap_err();
  assert!(matches!(err, SolveError::DuplicateModuleName { ref names } if names == &["Core".to_string()]));
}

#[test]
fn unresolved_imports_are_batched() {
  let list = ModuleList {
    modules: vec![module("A", &["Ghost"]), module("B", &["Phantom", "A"])],
    ..Default::default()
  };

  let err = solve(SolveInput::project(list), &BTreeMap::new()).unwrap_err();

  let message = err.to_string();
  assert!(message.contains("A -> [Ghost]"));
  assert!(message.contains("B -> [Phantom]"));
}
