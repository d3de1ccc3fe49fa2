//! Next-build resolution (`NextBuildResolver`, spec.md §4.D).
//!
//! Decides whether a downstream job already has a build waiting for this
//! event (or, for the external path, a `CREATED` build in the target
//! pipeline's queue) before the lifecycle layer falls back to creating one.

use conveyor_model::{Build, BuildStatus, Event, Job, JobId};

use crate::collaborators::Collaborators;
use crate::error::EngineError;
use crate::helpers::parallel_builds;

/// Find an existing build for `next_job` within `event` — either one
/// already created for this event, or, if this event is itself a restart
/// (`parent_event_id.is_some()`), one running in a sibling pipeline's event
/// of the same restart lineage.
pub async fn find_internal_next_build(
  collab: &Collaborators,
  event: &Event,
  next_job: &Job,
) -> Result<Option<Build>, EngineError> {
  let own_builds = collab.builds.list_for_event(event.id).await?;
  if let Some(build) = own_builds.into_iter().find(|b| b.job_id == next_job.id) {
    return Ok(Some(build));
  }

  if event.parent_event_id.is_some() {
    let siblings = parallel_builds(collab, event.group_event_id, Some(event.pipeline_id)).await?;
    if let Some((_, build)) = siblings.into_iter().find(|(job, _)| job.id == next_job.id) {
      return Ok(Some(build));
    }
  }

  Ok(None)
}

/// Find a `CREATED` build already queued for `job_id` within `event_id` in
/// the external pipeline — a sibling join member got there first.
///
/// `list_for_job_and_event` is documented to return most-recently-created
/// first; this must await the full list before indexing into it (spec §9's
/// "index before awaiting" caution), never index a still-pending future.
pub async fn find_external_pending_build(
  collab: &Collaborators,
  job_id: JobId,
  event_id: conveyor_model::EventId,
) -> Result<Option<Build>, EngineError> {
  let candidates = collab.builds.list_for_job_and_event(job_id, event_id).await?;
  Ok(candidates.into_iter().find(|b| b.status == BuildStatus::Created))
}
