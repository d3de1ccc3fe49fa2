use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{BuildId, EventId};
use crate::PipelineId;

/// One pipeline's contribution to a build's parent-builds ledger: the event
/// that produced it, and which of its jobs have reported in so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContribution {
  pub event_id: Option<EventId>,
  jobs: BTreeMap<String, Option<BuildId>>,
}

impl PipelineContribution {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build id reported for `job_name`, if any job by that name has been
  /// declared (distinct from "declared but not yet known", which is
  /// `Some(None)` internally and `None` here too — callers use
  /// [`PipelineContribution::has_job`] to tell the two apart).
  pub fn job(&self, job_name: &str) -> Option<BuildId> {
    self.jobs.get(job_name).copied().flatten()
  }

  /// Whether `job_name` has an entry at all (null or filled).
  pub fn has_job(&self, job_name: &str) -> bool {
    self.jobs.contains_key(job_name)
  }

  pub fn set_job(&mut self, job_name: impl Into<String>, build_id: Option<BuildId>) {
    self.jobs.insert(job_name.into(), build_id);
  }

  pub fn jobs(&self) -> impl Iterator<Item = (&str, Option<BuildId>)> {
    self.jobs.iter().map(|(k, v)| (k.as_str(), *v))
  }
}

/// The nested parent-builds map a build carries: for every upstream job that
/// can participate in one of its joins, the id of the build that satisfied
/// it, or `None` if it hasn't reported yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentBuilds(BTreeMap<PipelineId, PipelineContribution>);

impl ParentBuilds {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, pipeline_id: PipelineId) -> Option<&PipelineContribution> {
    self.0.get(&pipeline_id)
  }

  pub fn entry(&mut self, pipeline_id: PipelineId) -> &mut PipelineContribution {
    self.0.entry(pipeline_id).or_default()
  }

  pub fn iter(&self) -> impl Iterator<Item = (PipelineId, &PipelineContribution)> {
    self.0.iter().map(|(k, v)| (*k, v))
  }
}
