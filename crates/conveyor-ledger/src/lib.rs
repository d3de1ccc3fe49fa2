//! Parent-builds ledger construction, merge, and fill.
//!
//! The ledger is the nested map every build carries: for each pipeline that
//! can contribute to one of its joins, which of that pipeline's jobs have
//! reported a build id. This crate builds it (`singleton`, `join_skeleton`),
//! combines it (`merge`, associative and right-biased), and patches its
//! nulls from already-loaded candidate builds (`fill`).

use conveyor_model::{Build, Job, ParentBuilds, PipelineId, WorkflowGraph};
use conveyor_trigger_name::{classify, trim_job_name};

/// A ledger contributed by a single upstream build: just its own pipeline,
/// event, and job entry.
pub fn singleton(
  pipeline_id: PipelineId,
  event_id: conveyor_model::EventId,
  job_name: impl Into<String>,
  build_id: conveyor_model::BuildId,
) -> ParentBuilds {
  let mut ledger = ParentBuilds::new();
  let contribution = ledger.entry(pipeline_id);
  contribution.event_id = Some(event_id);
  contribution.set_job(job_name, Some(build_id));
  ledger
}

/// The skeleton of null entries a join needs before anything has reported
/// in: one entry per name in `join_list_names`, classified and grouped by
/// pipeline (entries for the same pipeline are merged into one contribution).
pub fn join_skeleton(current_pipeline_id: PipelineId, join_list_names: &[String]) -> ParentBuilds {
  let mut ledger = ParentBuilds::new();
  for name in join_list_names {
    let trigger_ref = classify(name, current_pipeline_id);
    let contribution = ledger.entry(trigger_ref.pipeline_id);
    if !contribution.has_job(&trigger_ref.job_name) {
      contribution.set_job(trigger_ref.job_name, None);
    }
  }
  ledger
}

/// Deep-merge two ledgers: right-biased at leaves, union of keys at every
/// nested level.
///
/// Right-biased means a key present on the right always overwrites the
/// left's value for that key, even a `None` — callers should put the most
/// authoritative ledger last. In practice that's always true in this engine:
/// a [`join_skeleton`] (all-null) is merged first, then successively more
/// specific contributions are layered on top of it, never the reverse.
pub fn merge(left: ParentBuilds, right: ParentBuilds) -> ParentBuilds {
  let mut merged = left;
  for (pipeline_id, right_contribution) in right.iter() {
    let entry = merged.entry(pipeline_id);
    if right_contribution.event_id.is_some() {
      entry.event_id = right_contribution.event_id;
    }
    for (job_name, build_id) in right_contribution.jobs() {
      entry.set_job(job_name, build_id);
    }
  }
  merged
}

/// Fold [`merge`] over an ordered sequence of ledgers, left to right.
pub fn merge_all(ledgers: impl IntoIterator<Item = ParentBuilds>) -> ParentBuilds {
  ledgers
    .into_iter()
    .fold(ParentBuilds::new(), |acc, next| merge(acc, next))
}

/// Patch every null entry in `ledger` from `candidates`, the builds already
/// loaded for this event (or its parallel-build siblings).
///
/// For each `(pipelineId, jobName)` pair still null, the graph node it
/// should correspond to is derived (`trimJobName(jobName)` for the current
/// pipeline, `sd@<pid>:<jobName>` otherwise); if that node isn't in the
/// graph at all the entry is left null and a warning is logged — a
/// `GraphMismatch` is not fatal, the join simply re-evaluates when the next
/// upstream build reports in.
pub fn fill(
  ledger: &mut ParentBuilds,
  current_pipeline_id: PipelineId,
  graph: &WorkflowGraph,
  candidates: &[(Job, Build)],
) {
  let pending: Vec<(PipelineId, String)> = ledger
    .iter()
    .flat_map(|(pid, contribution)| {
      contribution
        .jobs()
        .filter(|(_, build_id)| build_id.is_none())
        .map(move |(job_name, _)| (pid, job_name.to_string()))
        .collect::<Vec<_>>()
    })
    .collect();

  for (pipeline_id, job_name) in pending {
    let expected_node_name = if pipeline_id == current_pipeline_id {
      trim_job_name(&job_name).to_string()
    } else {
      format!("sd@{pipeline_id}:{job_name}")
    };

    if !graph.has_node_named(&expected_node_name) {
      tracing::warn!(
        pipeline_id = %pipeline_id,
        job_name = %job_name,
        "no workflow-graph node matches ledger entry, leaving it null"
      );
      continue;
    }

    let Some((_, build)) = candidates.iter().find(|(job, _)| {
      job.pipeline_id == pipeline_id && job.canonical_name() == trim_job_name(&job_name)
    }) else {
      continue;
    };

    let contribution = ledger.entry(pipeline_id);
    contribution.set_job(job_name, Some(build.id));
    contribution.event_id = Some(build.event_id);
  }
}
