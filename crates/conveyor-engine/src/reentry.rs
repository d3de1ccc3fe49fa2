//! External re-entry handling (`ExternalReentryHandler`, spec.md §4.E).
//!
//! A build re-enters a pipeline it already has a ledger entry for when one
//! of its join members lives externally: the external pipeline's own join
//! needs this build's contribution merged in, not a brand-new trigger.

use conveyor_model::{Build, BuildStatus, Event, EventId, Job, PipelineId};
use conveyor_trigger_name::trim_job_name;

use crate::collaborators::Collaborators;
use crate::error::EngineError;
use crate::helpers::{event_scoped_builds, parallel_builds};
use crate::lifecycle;

/// Resolve the build a re-entry into `ext_pipeline_id` should affect.
///
/// `ext_event_id` is the event this build already recorded against
/// `ext_pipeline_id` in its ledger (the caller has already confirmed that
/// entry exists; this is only reached on the re-entry path).
pub async fn resolve(
  collab: &Collaborators,
  triggering_event: &Event,
  current_job: &Job,
  current_build: &Build,
  ext_pipeline_id: PipelineId,
  ext_job_name: &str,
  ext_event_id: EventId,
) -> Result<Option<Build>, EngineError> {
  let ext_event = collab
    .events
    .get(ext_event_id)
    .await?
    .ok_or(EngineError::EventNotFound(ext_event_id))?;

  let target_node_name = if ext_event.workflow_graph.has_node_named(ext_job_name) {
    ext_job_name.to_string()
  } else {
    let trimmed = trim_job_name(ext_job_name);
    if ext_event.workflow_graph.has_node_named(trimmed) {
      trimmed.to_string()
    } else {
      return Err(EngineError::GraphMismatch(ext_job_name.to_string()));
    }
  };

  let Some(ext_job) = collab.jobs.get_by_name(ext_pipeline_id, &target_node_name).await? else {
    return Err(EngineError::GraphMismatch(target_node_name));
  };
  if !ext_job.is_enabled() {
    return Ok(None);
  }

  let own = event_scoped_builds(collab, ext_event.id).await?;
  let group = parallel_builds(collab, ext_event.group_event_id, None).await?;
  let candidates: Vec<_> = own.into_iter().chain(group).collect();

  let join_list = ext_event.workflow_graph.src_for_join(&target_node_name);
  let base_ledger = conveyor_ledger::merge(
    conveyor_ledger::join_skeleton(ext_pipeline_id, &join_list),
    current_build.parent_builds.clone(),
  );
  let contribution = conveyor_ledger::singleton(
    triggering_event.pipeline_id,
    triggering_event.id,
    current_job.canonical_name(),
    current_build.id,
  );
  let mut ledger = conveyor_ledger::merge(base_ledger, contribution);
  conveyor_ledger::fill(&mut ledger, ext_pipeline_id, &ext_event.workflow_graph, &candidates);

  let next_build = candidates
    .iter()
    .filter(|(job, _)| job.id == ext_job.id)
    .max_by_key(|(_, build)| build.created_at)
    .map(|(_, build)| build.clone());

  match next_build {
    None => {
      resolve_fresh(
        collab,
        &ext_event,
        ext_pipeline_id,
        &target_node_name,
        triggering_event,
        current_job,
        current_build,
        ledger,
      )
      .await
    }
    Some(build) if build.status == BuildStatus::Created => {
      let updated = lifecycle::update_parent_builds(collab, build.id, ledger, current_build.id).await?;
      Ok(Some(updated))
    }
    Some(prior) => resolve_restart(collab, current_job, current_build, triggering_event, &ext_event, ext_job_name, &ext_job, prior, ledger).await,
  }
}

/// No build has ever run for the re-entry target: derive its parent from
/// the graph edge that fed the external placeholder node in the first
/// place (the join member whose trigger originally sent this build across
/// pipelines), not from the re-entry target's own join edges.
async fn resolve_fresh(
  collab: &Collaborators,
  ext_event: &Event,
  ext_pipeline_id: PipelineId,
  target_node_name: &str,
  triggering_event: &Event,
  current_job: &Job,
  current_build: &Build,
  ledger: conveyor_model::ParentBuilds,
) -> Result<Option<Build>, EngineError> {
  let placeholder_name = format!("sd@{}:{}", triggering_event.pipeline_id, current_job.canonical_name());
  let parent_job_name = ext_event
    .workflow_graph
    .src_for_join(&placeholder_name)
    .into_iter()
    .next()
    .ok_or_else(|| EngineError::GraphMismatch(placeholder_name.clone()))?;

  let parent_build_id = current_build
    .parent_builds
    .get(ext_pipeline_id)
    .and_then(|contribution| contribution.job(&parent_job_name))
    .ok_or_else(|| EngineError::GraphMismatch(parent_job_name.clone()))?;

  let Some(ext_job) = collab.jobs.get_by_name(ext_pipeline_id, target_node_name).await? else {
    return Err(EngineError::GraphMismatch(target_node_name.to_string()));
  };

  lifecycle::create_build_for(collab, ext_event, parent_build_id, &ext_job, ledger).await
}

/// A build already ran for the re-entry target, but it's no longer pending
/// (it belongs to a finished run): restart by minting a fresh event in the
/// external pipeline rooted at the same restart lineage as the prior run.
async fn resolve_restart(
  collab: &Collaborators,
  current_job: &Job,
  current_build: &Build,
  triggering_event: &Event,
  ext_event: &Event,
  ext_job_name: &str,
  ext_job: &Job,
  prior_build: Build,
  ledger: conveyor_model::ParentBuilds,
) -> Result<Option<Build>, EngineError> {
  let restart_root_event = collab
    .events
    .get(prior_build.event_id)
    .await?
    .ok_or(EngineError::EventNotFound(prior_build.event_id))?;

  // Restart from the placeholder node that fed this flow across pipelines
  // in the first place, not from the re-entry target itself — `~Y` is
  // essentially never a graph node, so that would always fall through.
  let tilde_name = format!("~sd@{}:{}", triggering_event.pipeline_id, current_job.canonical_name());
  let start_from = if ext_event.workflow_graph.has_node_named(&tilde_name) {
    tilde_name
  } else {
    ext_job_name.to_string()
  };

  let cause_message = format!(
    "Triggered by sd@{}:{}",
    triggering_event.pipeline_id,
    current_job.canonical_name()
  );

  let new_event = lifecycle::create_external_build(
    collab,
    current_build.id,
    ext_event.pipeline_id,
    start_from,
    cause_message,
    Some(ledger),
    None,
    Some(restart_root_event.group_event_id),
  )
  .await?;

  let fresh_candidates = event_scoped_builds(collab, new_event.id).await?;
  Ok(
    fresh_candidates
      .into_iter()
      .find(|(job, _)| job.id == ext_job.id)
      .map(|(_, build)| build),
  )
}
