use serde::{Deserialize, Serialize};

use crate::graph::WorkflowGraph;
use crate::id::EventId;
use crate::PipelineId;

/// Pull-request metadata carried by an event created from a PR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrMetadata {
  #[serde(rename = "ref")]
  pub pr_ref: String,
  pub pr_source: String,
  pub pr_info: serde_json::Value,
}

/// One execution of a pipeline's workflow graph.
///
/// `group_event_id` is invariant across restarts: every event in a restart
/// lineage shares the id of the lineage's root event (itself, for a root
/// event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id: EventId,
  pub pipeline_id: PipelineId,
  pub workflow_graph: WorkflowGraph,
  pub sha: String,
  pub config_pipeline_sha: Option<String>,
  pub parent_event_id: Option<EventId>,
  pub group_event_id: EventId,
  pub base_branch: Option<String>,
  pub pr: Option<PrMetadata>,
}

impl Event {
  /// Whether this event is the root of its restart lineage.
  pub fn is_group_root(&self) -> bool {
    self.group_event_id == self.id
  }
}
