//! Build lifecycle actions (`BuildLifecycle`, spec.md §4.F).
//!
//! The four mutating operations the rest of the engine composes:
//! create a build in the current pipeline, mint an event in another one,
//! merge a new contribution into an existing build's ledger under
//! optimistic-concurrency retry, and decide what a freshly-evaluated join
//! means for a build's status.

use conveyor_join::JoinOutcome;
use conveyor_model::{Build, BuildId, BuildStatus, Event, Job, ParentBuilds, PipelineId};
use conveyor_store::{CreateBuildPayload, CreateEventPayload, StoreError};

use crate::collaborators::Collaborators;
use crate::error::EngineError;

async fn build_payload_for(
  collab: &Collaborators,
  event: &Event,
  parent_build_id: BuildId,
  job: &Job,
  ledger: ParentBuilds,
) -> Result<CreateBuildPayload, EngineError> {
  let pipeline = collab
    .pipelines
    .get(event.pipeline_id)
    .await?
    .ok_or(EngineError::PipelineNotFound(event.pipeline_id))?;

  let mut payload = CreateBuildPayload::new(
    job.id,
    event.sha.clone(),
    vec![parent_build_id],
    ledger,
    event.id,
    pipeline.admin.username.clone(),
    pipeline.scm_context.clone(),
  );
  payload.config_pipeline_sha = event.config_pipeline_sha.clone();
  payload.pr = event.pr.clone();
  payload.base_branch = event.base_branch.clone();
  // The build is created CREATED, not RUNNING: the caller decides whether
  // to queue-and-start it unconditionally (an OR-trigger) or defer that
  // decision to a join evaluation (`handle_new_build`).
  payload.start = false;
  Ok(payload)
}

/// Create a build for `job` within `event`, recording `parent_build_id` as
/// its immediate trigger. `Ok(None)` when the job is disabled (spec §4.F:
/// a disabled job is silently skipped, never an error).
pub async fn create_build_for(
  collab: &Collaborators,
  event: &Event,
  parent_build_id: BuildId,
  job: &Job,
  ledger: ParentBuilds,
) -> Result<Option<Build>, EngineError> {
  if !job.is_enabled() {
    return Ok(None);
  }
  let payload = build_payload_for(collab, event, parent_build_id, job, ledger).await?;
  Ok(Some(collab.builds.create(payload).await?))
}

/// `create_build_for` specialized to the common case: the new build's sole
/// trigger is the build that's currently being processed.
pub async fn create_internal_build(
  collab: &Collaborators,
  event: &Event,
  current_build: &Build,
  job: &Job,
  ledger: ParentBuilds,
) -> Result<Option<Build>, EngineError> {
  create_build_for(collab, event, current_build.id, job, ledger).await
}

/// Mint a downstream event in another pipeline (`createExternalBuild`,
/// spec §4.F / §6). Resolves a fresh commit sha for the target pipeline
/// (and its config pipeline, if it has one) through `scm` — never reuses
/// the triggering build's sha, since the external pipeline may live at a
/// different commit entirely.
pub async fn create_external_build(
  collab: &Collaborators,
  parent_build_id: BuildId,
  ext_pipeline_id: PipelineId,
  start_from: String,
  cause_message: String,
  parent_builds: Option<ParentBuilds>,
  parent_event_id: Option<conveyor_model::EventId>,
  group_event_id: Option<conveyor_model::EventId>,
) -> Result<Event, EngineError> {
  let pipeline = collab
    .pipelines
    .get(ext_pipeline_id)
    .await?
    .ok_or(EngineError::PipelineNotFound(ext_pipeline_id))?;

  let token = collab.scm.unseal_token(&pipeline.admin.username).await?;
  let sha = collab
    .scm
    .get_commit_sha(&pipeline.scm_context, &pipeline.scm_uri, &token)
    .await?;

  let config_pipeline_sha = match pipeline.config_pipeline_id {
    Some(config_pipeline_id) => {
      let config_pipeline = collab
        .pipelines
        .get(config_pipeline_id)
        .await?
        .ok_or(EngineError::PipelineNotFound(config_pipeline_id))?;
      let config_token = collab.scm.unseal_token(&config_pipeline.admin.username).await?;
      Some(
        collab
          .scm
          .get_commit_sha(&config_pipeline.scm_context, &config_pipeline.scm_uri, &config_token)
          .await?,
      )
    }
    None => None,
  };

  let mut payload = CreateEventPayload::new(
    ext_pipeline_id,
    start_from,
    cause_message,
    vec![parent_build_id],
    pipeline.scm_context.clone(),
    pipeline.admin.username.clone(),
    sha,
  );
  payload.parent_builds = parent_builds;
  payload.parent_event_id = parent_event_id;
  payload.group_event_id = group_event_id;
  payload.config_pipeline_sha = config_pipeline_sha;

  Ok(collab.events.create(payload).await?)
}

/// Re-read `target_build_id`, merge `new_contribution` into its ledger, and
/// persist — retrying from the re-read on a concurrency conflict (spec §5's
/// bounded optimistic-retry resolution of the racing-writers open question).
pub async fn update_parent_builds(
  collab: &Collaborators,
  target_build_id: BuildId,
  new_contribution: ParentBuilds,
  contributing_build_id: BuildId,
) -> Result<Build, EngineError> {
  let max_attempts = collab.config.retry.max_attempts.max(1);

  for attempt in 0..max_attempts {
    let mut fresh = collab
      .builds
      .get(target_build_id)
      .await?
      .ok_or(EngineError::Factory(StoreError::NotFound {
        kind: "build",
        id: target_build_id.to_string(),
      }))?;

    fresh.parent_builds = conveyor_ledger::merge(fresh.parent_builds, new_contribution.clone());
    fresh.add_parent(contributing_build_id);

    match collab.builds.update(&fresh).await {
      Ok(updated) => return Ok(updated),
      Err(StoreError::Conflict { .. }) => {
        tracing::warn!(build_id = %target_build_id, attempt, "lost ledger-update race, retrying");
        continue;
      }
      Err(other) => return Err(other.into()),
    }
  }

  Err(EngineError::ConcurrencyConflict(max_attempts))
}

/// Promote a build to `QUEUED` and immediately start it — the terminal
/// step shared by a completed join and an unconditional OR-trigger launch.
pub async fn queue_and_start(collab: &Collaborators, build: Build) -> Result<Build, EngineError> {
  let mut queued = build;
  queued.status = BuildStatus::Queued;
  let updated = collab.builds.update(&queued).await?;
  Ok(collab.builds.start(updated.id).await?)
}

/// Apply a join's verdict to the build it was evaluated for.
///
/// Not done: leave it as-is, nothing to do yet. Done with a failure: the
/// build can never run, so it's removed rather than queued. Done and clean:
/// queue then start it.
pub async fn handle_new_build(
  collab: &Collaborators,
  outcome: JoinOutcome,
  build: Build,
) -> Result<Option<Build>, EngineError> {
  if !outcome.done {
    return Ok(None);
  }

  if outcome.has_failure {
    if let Err(err) = collab.builds.remove(build.id).await {
      tracing::warn!(build_id = %build.id, error = %err, "failed to remove join-poisoned build");
    }
    return Ok(None);
  }

  Ok(Some(queue_and_start(collab, build).await?))
}
