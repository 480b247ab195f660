//! Scanning real source trees and staging the result.

use std::collections::BTreeMap;
use std::path::Path;

use tempfile::TempDir;

use bismuth_lib::config::{Target, TargetOverrides};
use bismuth_lib::platform::{Arch, Platform, Toolchain};
use bismuth_lib::record::Domain;
use bismuth_lib::scan::{load_target, scan_domain};

use super::common::{solve, write_file};

/// An engine with one C++20 module and a project whose module has partitions.
fn workspace() -> TempDir {
  let temp = TempDir::new().unwrap();
  let engine = temp.path().join("Engine");
  let project = temp.path().join("Game");

  write_file(&engine, "Core/Core.module.json", r#"{"name": "Core"}"#);
  write_file(&engine, "Core/Core.cppm", "export module Core;\nexport int answer();\n");
  write_file(&engine, "Core/Core.cpp", "module Core;\nint answer() { return 42; }\n");

  write_file(
    &project,
    "Game.bismuth",
    r#"{"Name": "Game", "EnginePath": "../Engine", "Configuration": "Shipping"}"#,
  );
  write_file(&project, "Game.rules.json", r#"{"finals": ["Render"]}"#);
  write_file(&project, "Render/Render.module.json", r#"{"name": "Render", "imports": ["Core"]}"#);
  write_file(
    &project,
    "Render/Render.cppm",
    "export module Render;\nexport import :mesh;\nexport import :scene;\nimport Core;\n",
  );
  write_file(&project, "Render/Mesh.cppm", "export module Render:mesh;\nimport Core;\n");
  write_file(&project, "Render/Scene.cppm", "export module Render:scene;\nimport :mesh;\n");
  write_file(&project, "Render/Scene.cpp", "module Render:scene;\n// import :lights;\n");
  write_file(
    &project,
    "ThirdParty/Fmt.deploy.json",
    r#"{"name": "Fmt", "includes": ["include"], "static_libs": ["lib/libfmt.a"]}"#,
  );
  temp
}

fn target(project: &Path) -> Target {
  let overrides = TargetOverrides {
    platform: Some(Platform::Unix),
    arch: Some(Arch::X86_64),
    toolchain: Some(Toolchain::Clang),
    ..Default::default()
  };
  Target::resolve(project, &overrides).unwrap()
}

#[test]
fn module_units_are_sorted_into_partitions() {
  let temp = workspace();
  let root = temp.path().join("Game");

  let list = scan_domain(&root).unwrap();
  let render = list.modules.iter().find(|m| m.name == "Render").unwrap();

  assert_eq!(render.interface_unit.as_deref(), Some(root.join("Render/Render.cppm").as_path()));
  assert_eq!(render.implementation_unit, None);

  let names: Vec<&str> = render.partitions.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, vec!["mesh", "scene"]);
  let scene = &render.partitions[1];
  assert_eq!(scene.interface.as_deref(), Some(root.join("Render/Scene.cppm").as_path()));
  assert_eq!(scene.implementation.as_deref(), Some(root.join("Render/Scene.cpp").as_path()));
}

#[test]
fn deploy_paths_resolve_against_descriptor_directory() {
  let temp = workspace();
  let root = temp.path().join("Game");

  let list = scan_domain(&root).unwrap();
  let fmt = &list.deploys[0];

  assert_eq!(fmt.name, "Fmt");
  assert_eq!(fmt.include_dirs(), vec![root.join("ThirdParty/include")]);
  assert_eq!(fmt.static_lib_paths(), vec![root.join("ThirdParty/lib/libfmt.a")]);
}

#[test]
fn content_hash_tracks_module_sources() {
  let temp = workspace();
  let root = temp.path().join("Engine");

  let before = scan_domain(&root).unwrap().modules[0].content_hash.clone();
  let again = scan_domain(&root).unwrap().modules[0].content_hash.clone();
  write_file(&root, "Core/Core.cpp", "module Core;\nint answer() { return 7; }\n");
  let after = scan_domain(&root).unwrap().modules[0].content_hash.clone();

  assert_eq!(before, again);
  assert_ne!(before, after);
}

#[test]
fn engine_and_project_stage_together() {
  let temp = workspace();
  let target = target(&temp.path().join("Game"));
  assert!(target.include_engine);
  assert_eq!(target.configuration, "Shipping");

  let input = load_target(&target).unwrap();
  let timeline = solve(input, &BTreeMap::new()).unwrap();

  assert_eq!(timeline.stage_names(), vec![vec!["Core", "Fmt"], vec!["Render"]]);
  assert_eq!(timeline.node("Core").unwrap().domain, Domain::Engine);

  let render = timeline.node("Render").unwrap();
  let partitions: Vec<Vec<&str>> = render.partition_order.iter().map(|s| s.names()).collect();
  assert_eq!(partitions, vec![vec!["mesh"], vec!["scene"]]);
  assert_eq!(timeline.final_targets[0].name, "Render");
}

#[test]
fn project_alone_cannot_resolve_engine_imports() {
  let temp = workspace();
  let overrides = TargetOverrides {
    platform: Some(Platform::Unix),
    arch: Some(Arch::X86_64),
    no_engine: true,
    ..Default::default()
  };
  let target = Target::resolve(&temp.path().join("Game"), &overrides).unwrap();

  let input = load_target(&target).unwrap();
  let err = solve(input, &BTreeMap::new()).unwrap_err();

  assert!(err.to_string().contains("Render -> [Core]"));
}
