//! Solver event reporting.

use tracing::{debug, info, warn};

use super::types::{CycleScope, StagedModuleInfo, UnresolvedRef};
use crate::record::Domain;

/// Receives staging events as the solver makes progress.
///
/// Every method defaults to a no-op.
pub trait SolveObserver {
  /// A module was found stale, either directly or through `because`.
  fn on_stale(&mut self, _node: &StagedModuleInfo, _because: Option<&str>) {}

  /// A deploy is about to run its actions.
  fn on_deploy(&mut self, _name: &str, _domain: Domain) {}

  fn on_node_staged(&mut self, _stage: usize, _node: &StagedModuleInfo) {}

  fn on_final_resolved(&mut self, _name: &str) {}

  fn on_cycle_detected(&mut self, _scope: &CycleScope, _stuck: &[UnresolvedRef]) {}
}

impl<T: SolveObserver + ?Sized> SolveObserver for &mut T {
  fn on_stale(&mut self, node: &StagedModuleInfo, because: Option<&str>) {
    (**self).on_stale(node, because)
  }

  fn on_deploy(&mut self, name: &str, domain: Domain) {
    (**self).on_deploy(name, domain)
  }

  fn on_node_staged(&mut self, stage: usize, node: &StagedModuleInfo) {
    (**self).on_node_staged(stage, node)
  }

  fn on_final_resolved(&mut self, name: &str) {
    (**self).on_final_resolved(name)
  }

  fn on_cycle_detected(&mut self, scope: &CycleScope, stuck: &[UnresolvedRef]) {
    (**self).on_cycle_detected(scope, stuck)
  }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SolveObserver for NoopObserver {}

/// Reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SolveObserver for TracingObserver {
  fn on_stale(&mut self, node: &StagedModuleInfo, because: Option<&str>) {
    match because {
      Some(dep) => info!(module = %node.name, dependency = %dep, "module stale: dependency rebuilt"),
      None => info!(module = %node.name, "module stale: content changed"),
    }
  }

  fn on_deploy(&mut self, name: &str, domain: Domain) {
    info!(deploy = %name, %domain, "deploying");
  }

  fn on_node_staged(&mut self, stage: usize, node: &StagedModuleInfo) {
    debug!(stage, node = %node.name, up_to_date = node.up_to_date, "staged");
  }

  fn on_final_resolved(&mut self, name: &str) {
    debug!(target_name = %name, "final target resolved");
  }

  fn on_cycle_detected(&mut self, scope: &CycleScope, stuck: &[UnresolvedRef]) {
    let nodes: Vec<String> = stuck.iter().map(ToString::to_string).collect();
    warn!(%scope, stuck = ?nodes, "circular dependency");
  }
}
