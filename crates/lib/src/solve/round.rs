//! Per-round staging state shared by both solvers.

use std::collections::HashSet;

/// Snapshot of one staging round.
///
/// Each round is planned from the previous state and produces a new one;
/// nothing is mutated in place. Indices refer to the caller's node list.
#[derive(Debug, Clone, Default)]
pub(crate) struct RoundState {
  /// Nodes admitted this round, in discovery order.
  pub stageable: Vec<usize>,
  /// Names staged in earlier rounds.
  pub resolved: HashSet<String>,
  /// Nodes still waiting, in discovery order.
  pub remaining: Vec<usize>,
}

impl RoundState {
  pub fn initial(count: usize) -> Self {
    Self {
      stageable: Vec::new(),
      resolved: HashSet::new(),
      remaining: (0..count).collect(),
    }
  }

  pub fn is_done(&self) -> bool {
    self.remaining.is_empty() && self.stageable.is_empty()
  }

  /// Splits the waiting nodes into those `is_ready` admits and the rest.
  pub fn plan<F>(self, mut is_ready: F) -> Self
  where
    F: FnMut(usize, &HashSet<String>) -> bool,
  {
    let RoundState { resolved, remaining, .. } = self;
    let (stageable, remaining): (Vec<usize>, Vec<usize>) = remaining.into_iter().partition(|&i| is_ready(i, &resolved));
    RoundState {
      stageable,
      resolved,
      remaining,
    }
  }

  /// No node was admitted although some are still waiting.
  pub fn is_stuck(&self) -> bool {
    self.stageable.is_empty() && !self.remaining.is_empty()
  }

  /// Commits the admitted nodes' names as resolved for the next round.
  pub fn advance<I, S>(self, staged_names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let RoundState {
      mut resolved, remaining, ..
    } = self;
    resolved.extend(staged_names.into_iter().map(Into::into));
    RoundState {
      stageable: Vec::new(),
      resolved,
      remaining,
    }
  }
}
