use conveyor_model::{Build, EventId, Job, PipelineId};

use crate::collaborators::Collaborators;
use crate::error::EngineError;

/// Load the job each build belongs to, dropping any build whose job has
/// since been deleted rather than failing the whole batch over it.
async fn load_job_build_pairs(collab: &Collaborators, builds: Vec<Build>) -> Result<Vec<(Job, Build)>, EngineError> {
  let jobs = futures::future::try_join_all(builds.iter().map(|b| collab.jobs.get_by_id(b.job_id))).await?;

  Ok(jobs
    .into_iter()
    .zip(builds)
    .filter_map(|(job, build)| job.map(|job| (job, build)))
    .collect())
}

/// Every build that belongs to `event_id`, paired with its job — the
/// "finished builds for event" candidate set `spec.md` §4.B and §4.D read.
pub async fn event_scoped_builds(collab: &Collaborators, event_id: EventId) -> Result<Vec<(Job, Build)>, EngineError> {
  let builds = collab.builds.list_for_event(event_id).await?;
  load_job_build_pairs(collab, builds).await
}

/// The most recent build per job across a restart lineage — "parallel
/// builds", the candidate set a join in a sibling pipeline reads to find
/// builds that ran alongside it but belong to a different event. Excludes
/// `exclude_pipeline_id` when given.
pub async fn parallel_builds(
  collab: &Collaborators,
  group_event_id: EventId,
  exclude_pipeline_id: Option<PipelineId>,
) -> Result<Vec<(Job, Build)>, EngineError> {
  let builds = collab.builds.latest_builds_for_group(group_event_id).await?;
  let pairs = load_job_build_pairs(collab, builds).await?;

  Ok(match exclude_pipeline_id {
    Some(pid) => pairs.into_iter().filter(|(job, _)| job.pipeline_id != pid).collect(),
    None => pairs,
  })
}
