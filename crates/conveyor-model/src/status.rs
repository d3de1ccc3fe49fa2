use serde::{Deserialize, Serialize};

/// The closed set of states a build can be in.
///
/// `UNSTABLE` is deliberately both terminal *and* a failure for join
/// purposes (see [`BuildStatus::is_failure`]) — an unstable upstream build
/// must not let a join proceed, matching the policy that unstable results
/// never propagate downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
  Created,
  Queued,
  Running,
  Success,
  Failure,
  Aborted,
  Unstable,
  Collapsed,
}

impl BuildStatus {
  /// A build that has reached a final state and will not transition again.
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Self::Success | Self::Failure | Self::Aborted | Self::Unstable | Self::Collapsed
    )
  }

  /// A terminal state that should poison a join rather than satisfy it.
  pub fn is_failure(self) -> bool {
    matches!(
      self,
      Self::Failure | Self::Aborted | Self::Unstable | Self::Collapsed
    )
  }
}

impl std::fmt::Display for BuildStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Created => "CREATED",
      Self::Queued => "QUEUED",
      Self::Running => "RUNNING",
      Self::Success => "SUCCESS",
      Self::Failure => "FAILURE",
      Self::Aborted => "ABORTED",
      Self::Unstable => "UNSTABLE",
      Self::Collapsed => "COLLAPSED",
    };
    write!(f, "{}", s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unstable_is_both_terminal_and_failure() {
    assert!(BuildStatus::Unstable.is_terminal());
    assert!(BuildStatus::Unstable.is_failure());
  }

  #[test]
  fn running_is_neither() {
    assert!(!BuildStatus::Running.is_terminal());
    assert!(!BuildStatus::Running.is_failure());
  }

  #[test]
  fn success_is_terminal_not_failure() {
    assert!(BuildStatus::Success.is_terminal());
    assert!(!BuildStatus::Success.is_failure());
  }
}
