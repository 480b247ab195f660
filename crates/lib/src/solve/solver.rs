//! Module-level staging across the Engine and Project domains.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use super::cycles::find_cycles;
use super::observer::{SolveObserver, TracingObserver};
use super::partition::{PartitionIssues, SubModuleSolver};
use super::round::RoundState;
use super::types::{CycleScope, NodeKind, NodeRecord, SolveError, Stage, StagedModuleInfo, Timeline, UnresolvedRef};
use crate::deploy::Deployer;
use crate::record::{Domain, ModuleList};
use crate::store::StoredHashes;

/// Everything the solver consumes: the engine's records when the target
/// includes the engine, and the project's records.
#[derive(Debug, Clone, Default)]
pub struct SolveInput {
  pub engine: Option<ModuleList>,
  pub project: ModuleList,
}

impl SolveInput {
  pub fn project(project: ModuleList) -> Self {
    Self { engine: None, project }
  }

  pub fn with_engine(mut self, engine: ModuleList) -> Self {
    self.engine = Some(engine);
    self
  }

  pub fn needs_git(&self) -> bool {
    self.project.needs_git() || self.engine.as_ref().is_some_and(ModuleList::needs_git)
  }

  /// Nodes in discovery order: Engine before Project, and inside a domain
  /// modules before deploys.
  fn into_nodes(self) -> (Vec<(Domain, NodeRecord)>, Vec<String>) {
    let mut nodes = Vec::new();
    let mut finals: Vec<String> = self.project.finals().map(str::to_string).collect();

    if let Some(engine) = self.engine {
      finals.extend(engine.finals().map(str::to_string));
      push_domain(&mut nodes, Domain::Engine, engine);
    }
    push_domain(&mut nodes, Domain::Project, self.project);

    let mut seen = HashSet::new();
    finals.retain(|f| seen.insert(f.clone()));

    (nodes, finals)
  }
}

fn push_domain(nodes: &mut Vec<(Domain, NodeRecord)>, domain: Domain, list: ModuleList) {
  nodes.extend(list.modules.into_iter().map(|m| (domain, NodeRecord::Module(m))));
  nodes.extend(list.deploys.into_iter().map(|d| (domain, NodeRecord::Deploy(d))));
}

/// Turns discovered records into a staged `Timeline`.
///
/// Stored hashes decide staleness, `deployer` runs each deploy's actions as
/// the deploy is staged, and `observer` receives progress events.
pub struct Solver<'a, O = TracingObserver> {
  hashes: &'a dyn StoredHashes,
  deployer: &'a mut dyn Deployer,
  observer: O,
}

impl<'a> Solver<'a, TracingObserver> {
  pub fn new(hashes: &'a dyn StoredHashes, deployer: &'a mut dyn Deployer) -> Self {
    Self {
      hashes,
      deployer,
      observer: TracingObserver,
    }
  }
}

impl<'a, O: SolveObserver> Solver<'a, O> {
  pub fn with_observer<P: SolveObserver>(self, observer: P) -> Solver<'a, P> {
    Solver {
      hashes: self.hashes,
      deployer: self.deployer,
      observer,
    }
  }

  pub fn into_observer(self) -> O {
    self.observer
  }

  /// Stages every node.
  ///
  /// Graph integrity is checked first and problems of one kind are reported
  /// together. Each stage only holds nodes whose dependencies all sit in
  /// earlier stages; inside a stage nodes keep discovery order.
  pub fn solve(&mut self, input: SolveInput) -> Result<Timeline, SolveError> {
    let (nodes, finals) = input.into_nodes();
    info!(nodes = nodes.len(), finals = finals.len(), "solving module graph");

    preflight(&nodes, &finals)?;

    let mut pending: Vec<Option<StagedModuleInfo>> = Vec::with_capacity(nodes.len());
    for (domain, record) in nodes {
      let node = self.precompute(domain, record)?;
      if !node.up_to_date {
        self.observer.on_stale(&node, None);
      }
      pending.push(Some(node));
    }

    let deps: Vec<BTreeSet<String>> = pending
      .iter()
      .map(|n| n.as_ref().map(|n| n.depends_on.clone()).unwrap_or_default())
      .collect();
    let kinds: Vec<NodeKind> = pending
      .iter()
      .map(|n| n.as_ref().map_or(NodeKind::Module, |n| n.kind))
      .collect();

    let mut pending_finals = finals;
    let mut freshness: HashMap<String, bool> = HashMap::new();
    let mut timeline = Timeline::default();
    let mut round = RoundState::initial(pending.len());

    while !round.is_done() {
      round = round.plan(|i, resolved| kinds[i] == NodeKind::Deploy || deps[i].iter().all(|d| resolved.contains(d)));

      if round.is_stuck() {
        return Err(self.cycle_error(&round, &pending, &deps));
      }

      let stage_index = timeline.stages.len();
      let mut stage = Stage::default();

      for &i in &round.stageable {
        let Some(mut node) = pending[i].take() else {
          continue;
        };

        match &node.record {
          NodeRecord::Deploy(deploy) => {
            self.observer.on_deploy(&node.name, node.domain);
            self.deployer.deploy(deploy, node.domain)?;
          }
          NodeRecord::Module(_) => {
            let stale_dep = node
              .depends_on
              .iter()
              .find(|d| freshness.get(d.as_str()) == Some(&false))
              .cloned();
            if node.up_to_date
              && let Some(dep) = stale_dep
            {
              node.up_to_date = false;
              self.observer.on_stale(&node, Some(&dep));
            }
          }
        }

        freshness.insert(node.name.clone(), node.up_to_date);
        self.observer.on_node_staged(stage_index, &node);

        if let Some(pos) = pending_finals.iter().position(|f| *f == node.name) {
          pending_finals.remove(pos);
          self.observer.on_final_resolved(&node.name);
          timeline.final_targets.push(node.clone());
        }

        stage.nodes.push(node);
      }

      debug!(stage = stage_index, nodes = ?stage.names(), "stage committed");
      let names: Vec<String> = stage.nodes.iter().map(|n| n.name.clone()).collect();
      round = round.advance(names);
      timeline.stages.push(stage);
    }

    if !pending_finals.is_empty() {
      return Err(SolveError::UnresolvedFinalTarget { names: pending_finals });
    }

    info!(
      stages = timeline.stages.len(),
      stale = timeline.stale_modules().count(),
      "module graph solved"
    );

    Ok(timeline)
  }

  fn precompute(&self, domain: Domain, record: NodeRecord) -> Result<StagedModuleInfo, SolveError> {
    match record {
      NodeRecord::Module(module) => {
        let stored = self
          .hashes
          .stored_hash(domain, &module.name)
          .map_err(|source| SolveError::StoredHash {
            module: module.name.clone(),
            source,
          })?;
        let up_to_date = stored.as_deref() == Some(module.content_hash.as_str());

        let partition_order = if module.is_cxx_module {
          SubModuleSolver::new(&module, domain).solve()?
        } else {
          Vec::new()
        };

        Ok(StagedModuleInfo {
          name: module.name.clone(),
          kind: NodeKind::Module,
          domain,
          up_to_date,
          depends_on: module.imports.clone(),
          partition_order,
          actual_hash: Some(module.content_hash.clone()),
          record: NodeRecord::Module(module),
        })
      }
      NodeRecord::Deploy(deploy) => Ok(StagedModuleInfo {
        name: deploy.name.clone(),
        kind: NodeKind::Deploy,
        domain,
        up_to_date: true,
        depends_on: BTreeSet::new(),
        partition_order: Vec::new(),
        actual_hash: None,
        record: NodeRecord::Deploy(deploy),
      }),
    }
  }

  fn cycle_error(
    &mut self,
    round: &RoundState,
    pending: &[Option<StagedModuleInfo>],
    deps: &[BTreeSet<String>],
  ) -> SolveError {
    let stuck: Vec<(String, Vec<String>)> = round
      .remaining
      .iter()
      .filter_map(|&i| pending[i].as_ref().map(|n| (i, n)))
      .map(|(i, node)| {
        let unresolved = deps[i].iter().filter(|d| !round.resolved.contains(*d)).cloned().collect();
        (node.name.clone(), unresolved)
      })
      .collect();

    let cycles = find_cycles(&stuck);
    let stuck: Vec<UnresolvedRef> = stuck
      .into_iter()
      .map(|(node, missing)| UnresolvedRef { node, missing })
      .collect();

    self.observer.on_cycle_detected(&CycleScope::Modules, &stuck);

    SolveError::CircularDependency {
      scope: CycleScope::Modules,
      stuck,
      cycles,
    }
  }
}

/// Graph integrity checks run before anything is staged or deployed.
fn preflight(nodes: &[(Domain, NodeRecord)], finals: &[String]) -> Result<(), SolveError> {
  let mut seen: HashSet<&str> = HashSet::new();
  let mut duplicates: Vec<String> = Vec::new();
  for (_, record) in nodes {
    let name = record.name();
    if !seen.insert(name) && !duplicates.iter().any(|d| d == name) {
      duplicates.push(name.to_string());
    }
  }
  if !duplicates.is_empty() {
    return Err(SolveError::DuplicateModuleName { names: duplicates });
  }

  let unresolved: Vec<UnresolvedRef> = nodes
    .iter()
    .filter_map(|(_, record)| match record {
      NodeRecord::Module(m) => {
        let missing: Vec<String> = m.imports.iter().filter(|i| !seen.contains(i.as_str())).cloned().collect();
        (!missing.is_empty()).then(|| UnresolvedRef {
          node: m.name.clone(),
          missing,
        })
      }
      NodeRecord::Deploy(_) => None,
    })
    .collect();
  if !unresolved.is_empty() {
    return Err(SolveError::UnresolvedImport { unresolved });
  }

  let mut issues = PartitionIssues::default();
  for (domain, record) in nodes {
    if let NodeRecord::Module(m) = record
      && m.is_cxx_module
    {
      issues.extend(SubModuleSolver::new(m, *domain).check());
    }
  }
  issues.into_result()?;

  let missing_finals: Vec<String> = finals.iter().filter(|f| !seen.contains(f.as_str())).cloned().collect();
  if !missing_finals.is_empty() {
    return Err(SolveError::UnresolvedFinalTarget { names: missing_finals });
  }

  Ok(())
}
