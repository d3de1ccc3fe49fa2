use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a pipeline, shared by every crate in the workspace.
///
/// Defined here (rather than in `conveyor-model`) because [`crate::classify`]
/// needs it and `conveyor-model` depends on this crate, not the other way
/// around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(u64);

impl PipelineId {
  pub const fn new(id: u64) -> Self {
    Self(id)
  }

  pub const fn value(self) -> u64 {
    self.0
  }
}

impl fmt::Display for PipelineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for PipelineId {
  fn from(id: u64) -> Self {
    Self(id)
  }
}
