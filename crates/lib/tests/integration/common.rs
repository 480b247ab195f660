//! Fixtures shared by the integration tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bismuth_lib::deploy::{DeployError, Deployer};
use bismuth_lib::record::{DeployRecord, Domain, ModuleRecord, PartitionRecord};
use bismuth_lib::solve::{SolveError, SolveInput, SolveObserver, Solver, StagedModuleInfo, Timeline};

/// Ordered log of solver and deployer events.
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Observer writing `staged:<name>` and `stale:<name>` entries to a log.
pub struct Recorder(pub EventLog);

impl SolveObserver for Recorder {
  fn on_stale(&mut self, node: &StagedModuleInfo, _because: Option<&str>) {
    self.0.borrow_mut().push(format!("stale:{}", node.name));
  }

  fn on_node_staged(&mut self, _stage: usize, node: &StagedModuleInfo) {
    self.0.borrow_mut().push(format!("staged:{}", node.name));
  }
}

pub fn module(name: &str, imports: &[&str]) -> ModuleRecord {
  ModuleRecord::new(name, format!("/src/{name}"))
    .with_hash(format!("{name}-v1"))
    .with_imports(imports.iter().copied())
}

pub fn partition(name: &str, imports: &[&str]) -> PartitionRecord {
  PartitionRecord::new(name)
    .with_interface(format!("/src/M/{name}.cppm"))
    .with_imports(imports.iter().copied())
}

/// Solves `input` against `hashes`, with deploys appended to `log`.
pub fn solve_logged(input: SolveInput, hashes: &BTreeMap<String, String>, log: &EventLog) -> Result<Timeline, SolveError> {
  let deploy_log = log.clone();
  let mut deployer = move |record: &DeployRecord, _: Domain| -> Result<(), DeployError> {
    deploy_log.borrow_mut().push(format!("deploy:{}", record.name));
    Ok(())
  };
  let deployer: &mut dyn Deployer = &mut deployer;
  Solver::new(hashes, deployer)
    .with_observer(Recorder(log.clone()))
    .solve(input)
}

pub fn solve(input: SolveInput, hashes: &BTreeMap<String, String>) -> Result<Timeline, SolveError> {
  solve_logged(input, hashes, &EventLog::default())
}

/// Writes `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> PathBuf {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(&path, contents).unwrap();
  path
}
