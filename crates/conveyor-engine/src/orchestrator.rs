//! The trigger orchestrator (`TriggerOrchestrator`, spec.md §4.G).
//!
//! Dispatches each downstream node name from the workflow graph down one of
//! two shapes: an OR-trigger launches the next job unconditionally off this
//! one edge; a join member instead goes through next-build resolution and
//! is only started once every other declared parent has reported in.

use conveyor_model::{Build, BuildId, Event, EventId, Job, ParentBuilds, PipelineId};
use conveyor_trigger_name::classify;
use tracing::instrument;

use crate::collaborators::Collaborators;
use crate::error::EngineError;
use crate::helpers::event_scoped_builds;
use crate::lifecycle;
use crate::reentry;
use crate::resolver;

/// Owns the collaborators and coordinates a build's downstream trigger fan-out.
pub struct TriggerOrchestrator {
  collab: Collaborators,
}

/// Input to [`TriggerOrchestrator::trigger_event`] (spec §6's
/// `triggerEvent(config)`): mint a downstream event for an arbitrary
/// pipeline, outside the fan-out `trigger_next_jobs` drives off a build.
pub struct TriggerEventConfig {
  pub pipeline_id: PipelineId,
  pub start_from: String,
  pub cause_message: String,
  pub parent_build_id: BuildId,
  pub parent_builds: Option<ParentBuilds>,
  pub parent_event_id: Option<EventId>,
  pub group_event_id: Option<EventId>,
}

impl TriggerOrchestrator {
  pub fn new(collab: Collaborators) -> Self {
    Self { collab }
  }

  /// Trigger every downstream node reachable from `current_build`'s job,
  /// returning the builds that were created, updated, or started as a
  /// result. A node that isn't ready to start yet (its join isn't done) is
  /// simply absent from the result, not an error.
  #[instrument(skip(self, current_build), fields(build_id = %current_build.id))]
  pub async fn trigger_next_jobs(&self, current_build: &Build) -> Result<Vec<Build>, EngineError> {
    let event = self
      .collab
      .events
      .get(current_build.event_id)
      .await?
      .ok_or(EngineError::EventNotFound(current_build.event_id))?;

    let current_job = self
      .collab
      .jobs
      .get_by_id(current_build.job_id)
      .await?
      .ok_or(EngineError::JobNotFound(current_build.job_id))?;

    let next_names = self
      .collab
      .parser
      .next_jobs(&event.workflow_graph, &current_job.name, self.collab.config.chain_pr);

    let mut triggered = Vec::with_capacity(next_names.len());
    for name in next_names {
      if let Some(build) = self.trigger_one(&event, &current_job, current_build, &name).await? {
        triggered.push(build);
      }
    }
    Ok(triggered)
  }

  /// Create a downstream event for an arbitrary pipeline (spec §6's
  /// `triggerEvent(config)`), independent of any build's own trigger
  /// fan-out. A thin wrapper over the same `create_external_build` path
  /// `trigger_next_jobs`'s external branch uses.
  #[instrument(skip(self, config), fields(pipeline_id = %config.pipeline_id))]
  pub async fn trigger_event(&self, config: TriggerEventConfig) -> Result<Event, EngineError> {
    lifecycle::create_external_build(
      &self.collab,
      config.parent_build_id,
      config.pipeline_id,
      config.start_from,
      config.cause_message,
      config.parent_builds,
      config.parent_event_id,
      config.group_event_id,
    )
    .await
  }

  async fn trigger_one(
    &self,
    event: &Event,
    current_job: &Job,
    current_build: &Build,
    next_name: &str,
  ) -> Result<Option<Build>, EngineError> {
    let join_list = self.collab.parser.src_for_join(&event.workflow_graph, next_name);
    let is_or_trigger = !Self::is_join_member(&join_list, event.pipeline_id, current_job);
    let trigger_ref = classify(next_name, event.pipeline_id);

    if trigger_ref.is_external {
      self
        .trigger_external(
          event,
          current_job,
          current_build,
          trigger_ref.pipeline_id,
          &trigger_ref.job_name,
          &join_list,
          is_or_trigger,
        )
        .await
    } else {
      self
        .trigger_internal(event, current_job, current_build, &trigger_ref.job_name, &join_list, is_or_trigger)
        .await
    }
  }

  /// Whether `join_list` (already filtered to AND-join edges, §4.B) names
  /// `current_job` in any of the forms it could legitimately appear under —
  /// its own name, its canonical (PR-trimmed) name, or its external
  /// (`sd@pid:job`) form as seen from another pipeline's graph.
  fn is_join_member(join_list: &[String], current_pipeline_id: conveyor_model::PipelineId, current_job: &Job) -> bool {
    if join_list.is_empty() {
      return false;
    }
    let external_form = format!("sd@{}:{}", current_pipeline_id, current_job.canonical_name());
    join_list
      .iter()
      .any(|name| name == &current_job.name || name == current_job.canonical_name() || name == &external_form)
  }

  async fn trigger_internal(
    &self,
    event: &Event,
    current_job: &Job,
    current_build: &Build,
    job_name: &str,
    join_list: &[String],
    is_or_trigger: bool,
  ) -> Result<Option<Build>, EngineError> {
    let Some(next_job) = self.collab.jobs.get_by_name(event.pipeline_id, job_name).await? else {
      return Err(EngineError::GraphMismatch(job_name.to_string()));
    };
    if !next_job.is_enabled() {
      return Ok(None);
    }

    if is_or_trigger {
      // OR-trigger: this edge alone launches `next_job`, unconditionally
      // and immediately — never gated on the node's other declared parents.
      let contribution = conveyor_ledger::singleton(
        event.pipeline_id,
        event.id,
        current_job.canonical_name(),
        current_build.id,
      );
      let Some(created) = lifecycle::create_internal_build(&self.collab, event, current_build, &next_job, contribution).await? else {
        return Ok(None);
      };
      return Ok(Some(lifecycle::queue_and_start(&self.collab, created).await?));
    }

    if let Some(existing) = resolver::find_internal_next_build(&self.collab, event, &next_job).await? {
      let contribution = conveyor_ledger::singleton(
        event.pipeline_id,
        event.id,
        current_job.canonical_name(),
        current_build.id,
      );
      let updated = lifecycle::update_parent_builds(&self.collab, existing.id, contribution, current_build.id).await?;
      return self.finalize(updated).await;
    }

    let ledger = self.seed_ledger(event, join_list, event.pipeline_id, current_job, current_build).await?;
    match lifecycle::create_internal_build(&self.collab, event, current_build, &next_job, ledger).await? {
      Some(created) => self.finalize(created).await,
      None => Ok(None),
    }
  }

  #[allow(clippy::too_many_arguments)]
  async fn trigger_external(
    &self,
    event: &Event,
    current_job: &Job,
    current_build: &Build,
    ext_pipeline_id: conveyor_model::PipelineId,
    ext_job_name: &str,
    join_list: &[String],
    is_or_trigger: bool,
  ) -> Result<Option<Build>, EngineError> {
    let reentry_event_id = if is_or_trigger {
      current_build
        .parent_builds
        .get(ext_pipeline_id)
        .and_then(|contribution| contribution.event_id)
    } else {
      None
    };

    if let Some(ext_event_id) = reentry_event_id {
      let resolved = reentry::resolve(
        &self.collab,
        event,
        current_job,
        current_build,
        ext_pipeline_id,
        ext_job_name,
        ext_event_id,
      )
      .await?;
      return match resolved {
        Some(build) => self.finalize(build).await,
        None => Ok(None),
      };
    }

    let Some(ext_job) = self.collab.jobs.get_by_name(ext_pipeline_id, ext_job_name).await? else {
      return Err(EngineError::GraphMismatch(format!("sd@{ext_pipeline_id}:{ext_job_name}")));
    };
    if !ext_job.is_enabled() {
      return Ok(None);
    }

    if is_or_trigger {
      // No prior ledger entry for the target pipeline: a brand new,
      // unconditional downstream run (spec §8 S5).
      let contribution = conveyor_ledger::singleton(
        event.pipeline_id,
        event.id,
        current_job.canonical_name(),
        current_build.id,
      );
      let cause_message = format!("Triggered by sd@{}:{}", event.pipeline_id, current_job.canonical_name());
      let new_event = lifecycle::create_external_build(
        &self.collab,
        current_build.id,
        ext_pipeline_id,
        format!("~sd@{}:{}", event.pipeline_id, current_job.canonical_name()),
        cause_message,
        Some(contribution),
        event.parent_event_id.is_none().then_some(event.id),
        None,
      )
      .await?;

      let candidates = event_scoped_builds(&self.collab, new_event.id).await?;
      let Some((_, created)) = candidates.into_iter().find(|(job, _)| job.id == ext_job.id) else {
        return Ok(None);
      };
      return Ok(Some(lifecycle::queue_and_start(&self.collab, created).await?));
    }

    // Real external join member: find (or wait for) a pending build in the
    // target pipeline's queue rather than minting a fresh event outright.
    if let Some(pending) = resolver::find_external_pending_build(&self.collab, ext_job.id, event.id).await? {
      let contribution = conveyor_ledger::singleton(
        event.pipeline_id,
        event.id,
        current_job.canonical_name(),
        current_build.id,
      );
      let updated = lifecycle::update_parent_builds(&self.collab, pending.id, contribution, current_build.id).await?;
      return self.finalize(updated).await;
    }

    let contribution = conveyor_ledger::singleton(
      event.pipeline_id,
      event.id,
      current_job.canonical_name(),
      current_build.id,
    );
    let cause_message = format!("Triggered by sd@{}:{}", event.pipeline_id, current_job.canonical_name());
    let seed = conveyor_ledger::merge(conveyor_ledger::join_skeleton(ext_pipeline_id, join_list), contribution);
    let new_event = lifecycle::create_external_build(
      &self.collab,
      current_build.id,
      ext_pipeline_id,
      format!("~sd@{}:{}", event.pipeline_id, current_job.canonical_name()),
      cause_message,
      Some(seed),
      event.parent_event_id.is_none().then_some(event.id),
      None,
    )
    .await?;

    let candidates = event_scoped_builds(&self.collab, new_event.id).await?;
    match candidates.into_iter().find(|(job, _)| job.id == ext_job.id).map(|(_, build)| build) {
      Some(created) => self.finalize(created).await,
      None => Ok(None),
    }
  }

  /// Build the ledger a freshly-created downstream build should start
  /// with: the join's skeleton, this build's own contribution, and
  /// whatever else is already known from sibling builds in the same event.
  async fn seed_ledger(
    &self,
    event: &Event,
    join_list: &[String],
    contributing_pipeline_id: conveyor_model::PipelineId,
    current_job: &Job,
    current_build: &Build,
  ) -> Result<ParentBuilds, EngineError> {
    let skeleton = if join_list.is_empty() {
      ParentBuilds::new()
    } else {
      conveyor_ledger::join_skeleton(contributing_pipeline_id, join_list)
    };
    let contribution = conveyor_ledger::singleton(
      event.pipeline_id,
      event.id,
      current_job.canonical_name(),
      current_build.id,
    );
    let mut ledger = conveyor_ledger::merge(skeleton, contribution);

    let candidates = event_scoped_builds(&self.collab, event.id).await?;
    conveyor_ledger::fill(&mut ledger, event.pipeline_id, &event.workflow_graph, &candidates);
    Ok(ledger)
  }

  /// Evaluate the join (if any) the freshly-touched build participates in
  /// within its own event's graph, then hand the verdict to the lifecycle
  /// layer. Running the evaluator here even on the re-entry path — rather
  /// than assuming re-entry always means "done" — guards against a build
  /// starting early when it has more than one external join member still
  /// outstanding.
  async fn finalize(&self, build: Build) -> Result<Option<Build>, EngineError> {
    let event = self
      .collab
      .events
      .get(build.event_id)
      .await?
      .ok_or(EngineError::EventNotFound(build.event_id))?;
    let job = self
      .collab
      .jobs
      .get_by_id(build.job_id)
      .await?
      .ok_or(EngineError::JobNotFound(build.job_id))?;

    // The graph node itself is keyed by the job's raw name (PR prefix and
    // all, per the `chainPR` convention); only ledger keys use the trimmed
    // canonical form. Fall back to the canonical form if the raw name
    // isn't in the graph, matching the defensive lookup in `reentry`.
    let node_name = if event.workflow_graph.has_node_named(&job.name) {
      job.name.as_str()
    } else {
      job.canonical_name()
    };
    let join_list = self.collab.parser.src_for_join(&event.workflow_graph, node_name);
    let outcome = if join_list.is_empty() {
      conveyor_join::JoinOutcome { done: true, has_failure: false }
    } else {
      conveyor_join::evaluate(&build.parent_builds, &join_list, event.pipeline_id, self.collab.builds.as_ref()).await?
    };

    lifecycle::handle_new_build(&self.collab, outcome, build).await
  }
}
