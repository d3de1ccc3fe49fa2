//! Trigger-name classification.
//!
//! Workflow-graph node names encode whether an edge stays within the current
//! pipeline or crosses into another one. This crate is the leaf of the
//! trigger-decision stack: every other component classifies a name before it
//! can do anything else with it.
//!
//! Three forms show up in a workflow graph:
//! - `build` — an internal job name.
//! - `PR-12:build` — a pull-request job; the canonical (ledger/graph) name is
//!   the portion after `:`.
//! - `sd@4521:build` — an external job, owned by pipeline `4521`.

mod id;

pub use id::PipelineId;

use std::fmt;

/// A workflow-graph node name, classified into its pipeline and job parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRef {
  pub pipeline_id: PipelineId,
  pub job_name: String,
  pub is_external: bool,
}

impl fmt::Display for TriggerRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_external {
      write!(f, "sd@{}:{}", self.pipeline_id, self.job_name)
    } else {
      write!(f, "{}", self.job_name)
    }
  }
}

const EXTERNAL_PREFIX: &str = "sd@";

/// Classify `name` relative to the pipeline it was read from.
///
/// External names match `sd@<digits>:<job-name>`; anything else belongs to
/// `current_pipeline_id`.
pub fn classify(name: &str, current_pipeline_id: PipelineId) -> TriggerRef {
  if let Some(rest) = name.strip_prefix(EXTERNAL_PREFIX)
    && let Some(colon) = rest.find(':')
    && let Ok(pipeline_id) = rest[..colon].parse::<u64>()
  {
    return TriggerRef {
      pipeline_id: PipelineId::new(pipeline_id),
      job_name: rest[colon + 1..].to_string(),
      is_external: true,
    };
  }

  TriggerRef {
    pipeline_id: current_pipeline_id,
    job_name: name.to_string(),
    is_external: false,
  }
}

/// True iff `name` is a pull-request job name (`PR-<n>:<job>`).
///
/// Distinct from [`classify`]'s external check: a PR job's prefix is `PR-`,
/// never `sd@`, so a name can be PR *or* external but never both.
pub fn is_pr(name: &str) -> bool {
  !name.starts_with(EXTERNAL_PREFIX) && name.contains(':')
}

/// The canonical job name used for ledger keys and graph lookups: the
/// portion of a PR job name after `:`, or the name unchanged.
///
/// Idempotent: `trim_job_name(trim_job_name(x)) == trim_job_name(x)`.
pub fn trim_job_name(name: &str) -> &str {
  if is_pr(name) {
    name.rsplit_once(':').map(|(_, job)| job).unwrap_or(name)
  } else {
    name
  }
}
