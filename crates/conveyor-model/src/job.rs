use serde::{Deserialize, Serialize};

use conveyor_trigger_name::trim_job_name;

use crate::id::JobId;
use crate::PipelineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
  Enabled,
  Disabled,
}

/// One job within a pipeline.
///
/// A name containing `:` denotes a pull-request job; [`Job::canonical_name`]
/// is the portion used as a ledger key and for workflow-graph lookups
/// (invariant 4 in `spec.md` §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
  pub id: JobId,
  pub pipeline_id: PipelineId,
  pub name: String,
  pub state: JobState,
}

impl Job {
  pub fn canonical_name(&self) -> &str {
    trim_job_name(&self.name)
  }

  pub fn is_enabled(&self) -> bool {
    self.state == JobState::Enabled
  }
}
