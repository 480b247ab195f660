//! Cycle extraction for stuck staging rounds.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Returns the dependency cycles among `nodes`.
///
/// `nodes` pairs each stuck name with its unresolved dependencies; edges to
/// names outside the set are ignored, so a node that merely waits on a cycle
/// is not reported as part of one. Each cycle lists its members in input
/// order and cycles are ordered by their first member.
pub(crate) fn find_cycles(nodes: &[(String, Vec<String>)]) -> Vec<Vec<String>> {
  let mut graph: DiGraph<usize, ()> = DiGraph::new();
  let mut index: HashMap<&str, NodeIndex> = HashMap::new();

  for (position, (name, _)) in nodes.iter().enumerate() {
    index.insert(name.as_str(), graph.add_node(position));
  }

  for (name, deps) in nodes {
    let from = index[name.as_str()];
    for dep in deps {
      if let Some(&to) = index.get(dep.as_str()) {
        graph.update_edge(from, to, ());
      }
    }
  }

  let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
    .into_iter()
    .filter(|component| component.len() > 1 || graph.contains_edge(component[0], component[0]))
    .map(|component| {
      let mut positions: Vec<usize> = component.iter().map(|&n| graph[n]).collect();
      positions.sort_unstable();
      positions
    })
    .collect();
  cycles.sort();

  cycles
    .into_iter()
    .map(|positions| positions.into_iter().map(|p| nodes[p].0.clone()).collect())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn node(name: &str, deps: &[&str]) -> (String, Vec<String>) {
    (name.to_string(), deps.iter().map(|d| d.to_string()).collect())
  }

  #[test]
  fn two_node_cycle() {
    let cycles = find_cycles(&[node("X", &["Y"]), node("Y", &["X"])]);
    assert_eq!(cycles, vec![vec!["X".to_string(), "Y".to_string()]]);
  }

  #[test]
  fn waiting_node_is_not_part_of_the_cycle() {
    let cycles = find_cycles(&[node("Z", &["X"]), node("X", &["Y"]), node("Y", &["X"])]);
    assert_eq!(cycles, vec![vec!["X".to_string(), "Y".to_string()]]);
  }

  #[test]
  fn self_import_is_a_cycle() {
    let cycles = find_cycles(&[node("a", &["a"])]);
    assert_eq!(cycles, vec![vec!["a".to_string()]]);
  }

  #[test]
  fn disjoint_cycles_ordered_by_first_member() {
    let cycles = find_cycles(&[
      node("p", &["q"]),
      node("a", &["b"]),
      node("q", &["p"]),
      node("b", &["a"]),
    ]);
    assert_eq!(
      cycles,
      vec![
        vec!["p".to_string(), "q".to_string()],
        vec!["a".to_string(), "b".to_string()],
      ]
    );
  }
}
