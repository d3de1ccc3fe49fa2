use conveyor_model::{BuildId, EventId, JobId, ParentBuilds, PipelineId, PrMetadata};

/// Everything needed to create an internal build. `start` defaults to
/// `true`; callers that need the created-but-not-started state (an
/// in-progress join) flip it off explicitly.
#[derive(Debug, Clone)]
pub struct CreateBuildPayload {
  pub job_id: JobId,
  pub sha: String,
  pub parent_build_id: Vec<BuildId>,
  pub parent_builds: ParentBuilds,
  pub event_id: EventId,
  pub username: String,
  pub config_pipeline_sha: Option<String>,
  pub scm_context: String,
  pub pr: Option<PrMetadata>,
  pub start: bool,
  pub base_branch: Option<String>,
}

impl CreateBuildPayload {
  pub fn new(
    job_id: JobId,
    sha: impl Into<String>,
    parent_build_id: Vec<BuildId>,
    parent_builds: ParentBuilds,
    event_id: EventId,
    username: impl Into<String>,
    scm_context: impl Into<String>,
  ) -> Self {
    Self {
      job_id,
      sha: sha.into(),
      parent_build_id,
      parent_builds,
      event_id,
      username: username.into(),
      config_pipeline_sha: None,
      scm_context: scm_context.into(),
      pr: None,
      start: true,
      base_branch: None,
    }
  }
}

/// Everything needed to create a downstream event in another pipeline.
/// Required fields are constructor arguments; optional ones default to
/// `None`.
#[derive(Debug, Clone)]
pub struct CreateEventPayload {
  pub pipeline_id: PipelineId,
  pub start_from: String,
  pub cause_message: String,
  pub parent_build_id: Vec<BuildId>,
  pub parent_builds: Option<ParentBuilds>,
  pub parent_event_id: Option<EventId>,
  pub group_event_id: Option<EventId>,
  pub scm_context: String,
  pub username: String,
  pub sha: String,
  pub config_pipeline_sha: Option<String>,
}

impl CreateEventPayload {
  pub fn new(
    pipeline_id: PipelineId,
    start_from: impl Into<String>,
    cause_message: impl Into<String>,
    parent_build_id: Vec<BuildId>,
    scm_context: impl Into<String>,
    username: impl Into<String>,
    sha: impl Into<String>,
  ) -> Self {
    Self {
      pipeline_id,
      start_from: start_from.into(),
      cause_message: cause_message.into(),
      parent_build_id,
      parent_builds: None,
      parent_event_id: None,
      group_event_id: None,
      scm_context: scm_context.into(),
      username: username.into(),
      sha: sha.into(),
      config_pipeline_sha: None,
    }
  }
}
