use std::collections::HashMap;

use async_trait::async_trait;
use conveyor_model::{Build, BuildId, Event, EventId, Job, JobId, Pipeline, PipelineId, WorkflowGraph};
use conveyor_store::{
  BuildFactory, CreateBuildPayload, CreateEventPayload, EventFactory, JobFactory, PipelineFactory, StoreError,
};
use tokio::sync::Mutex;

/// Names of the jobs a freshly-created event's `start_from` should create
/// the first build(s) for.
///
/// `start_from` is either a plain (optionally `~`-prefixed) job name — the
/// direct case, including a restart rooted at a specific job — or, for an
/// external trigger, a placeholder node (`sd@<srcPid>:<srcJob>`, `~`-prefixed
/// or not) that has no backing job of its own; its outgoing graph edges are
/// the real job(s) to start, the same placeholder-node convention
/// `conveyor_engine::reentry` relies on for `resolve_fresh`.
fn resolve_start_job_names(graph: &WorkflowGraph, jobs: &HashMap<u64, Job>, pipeline_id: PipelineId, start_from: &str) -> Vec<String> {
  let stripped = start_from.strip_prefix('~').unwrap_or(start_from);

  let is_direct_job = jobs
    .values()
    .any(|j| j.pipeline_id == pipeline_id && (j.name == stripped || j.canonical_name() == stripped));
  if is_direct_job {
    return vec![stripped.to_string()];
  }

  let Some(placeholder) = graph.nodes.iter().find(|n| n.name == stripped) else {
    return Vec::new();
  };
  graph
    .edges
    .iter()
    .filter(|e| e.src == placeholder.id)
    .filter_map(|e| graph.nodes.iter().find(|n| n.id == e.dest))
    .map(|n| n.name.clone())
    .collect()
}

#[derive(Default)]
struct State {
  pipelines: HashMap<u64, Pipeline>,
  jobs: HashMap<u64, Job>,
  events: HashMap<u64, Event>,
  builds: HashMap<u64, Build>,
  /// The workflow graph a freshly-created event in this pipeline should
  /// snapshot — stands in for "the pipeline's currently-parsed config",
  /// which in a real deployment comes from source control, not this crate.
  pipeline_graphs: HashMap<u64, WorkflowGraph>,
  next_event_id: u64,
  next_build_id: u64,
}

/// A single in-memory backing store implementing every collaborator trait.
///
/// Real deployments split these across services; a fixture only needs one
/// shared table of state, so this crate collapses them into one struct and
/// lets callers hand out `Arc<InMemoryStore>` cast to whichever trait
/// object a given collaborator slot needs.
#[derive(Default)]
pub struct InMemoryStore {
  state: Mutex<State>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn seed_pipeline(&self, pipeline: Pipeline, graph: WorkflowGraph) {
    let mut state = self.state.lock().await;
    state.pipeline_graphs.insert(pipeline.id.value(), graph);
    state.pipelines.insert(pipeline.id.value(), pipeline);
  }

  pub async fn seed_job(&self, job: Job) {
    self.state.lock().await.jobs.insert(job.id.value(), job);
  }

  pub async fn seed_event(&self, event: Event) {
    let mut state = self.state.lock().await;
    state.next_event_id = state.next_event_id.max(event.id.value() + 1);
    state.events.insert(event.id.value(), event);
  }

  pub async fn seed_build(&self, build: Build) {
    let mut state = self.state.lock().await;
    state.next_build_id = state.next_build_id.max(build.id.value() + 1);
    state.builds.insert(build.id.value(), build);
  }
}

#[async_trait]
impl PipelineFactory for InMemoryStore {
  async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>, StoreError> {
    Ok(self.state.lock().await.pipelines.get(&id.value()).cloned())
  }

  async fn get_jobs(&self, pipeline_id: PipelineId) -> Result<Vec<Job>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .await
        .jobs
        .values()
        .filter(|j| j.pipeline_id == pipeline_id)
        .cloned()
        .collect(),
    )
  }
}

#[async_trait]
impl JobFactory for InMemoryStore {
  async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError> {
    Ok(self.state.lock().await.jobs.get(&id.value()).cloned())
  }

  async fn get_by_name(&self, pipeline_id: PipelineId, name: &str) -> Result<Option<Job>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .await
        .jobs
        .values()
        .find(|j| j.pipeline_id == pipeline_id && (j.name == name || j.canonical_name() == name))
        .cloned(),
    )
  }
}

#[async_trait]
impl EventFactory for InMemoryStore {
  async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError> {
    Ok(self.state.lock().await.events.get(&id.value()).cloned())
  }

  async fn list_by_group(&self, group_event_id: EventId) -> Result<Vec<Event>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .await
        .events
        .values()
        .filter(|e| e.group_event_id == group_event_id)
        .cloned()
        .collect(),
    )
  }

  /// Mint a new event and, matching a real event factory's cascade, the
  /// first build for `start_from`'s job.
  async fn create(&self, payload: CreateEventPayload) -> Result<Event, StoreError> {
    let mut state = self.state.lock().await;

    let graph = state
      .pipeline_graphs
      .get(&payload.pipeline_id.value())
      .cloned()
      .ok_or(StoreError::NotFound {
        kind: "pipeline workflow graph",
        id: payload.pipeline_id.to_string(),
      })?;

    let event_id = EventId::new(state.next_event_id);
    state.next_event_id += 1;
    let group_event_id = payload.group_event_id.unwrap_or(event_id);

    let event = Event {
      id: event_id,
      pipeline_id: payload.pipeline_id,
      workflow_graph: graph,
      sha: payload.sha.clone(),
      config_pipeline_sha: payload.config_pipeline_sha.clone(),
      parent_event_id: payload.parent_event_id,
      group_event_id,
      base_branch: None,
      pr: None,
    };
    state.events.insert(event_id.value(), event.clone());

    let start_job_names = resolve_start_job_names(&graph, &state.jobs, payload.pipeline_id, &payload.start_from);
    for name in start_job_names {
      let Some(job) = state
        .jobs
        .values()
        .find(|j| j.pipeline_id == payload.pipeline_id && (j.name == name || j.canonical_name() == name))
        .cloned()
      else {
        continue;
      };
      let build_id = BuildId::new(state.next_build_id);
      state.next_build_id += 1;
      let build = Build::with_single_parent(
        build_id,
        event_id,
        job.id,
        payload.sha.clone(),
        payload.parent_build_id.first().copied().unwrap_or(build_id),
        payload.parent_builds.clone().unwrap_or_default(),
        chrono::Utc::now(),
      );
      state.builds.insert(build_id.value(), build);
    }

    Ok(event)
  }
}

#[async_trait]
impl BuildFactory for InMemoryStore {
  async fn get(&self, id: BuildId) -> Result<Option<Build>, StoreError> {
    Ok(self.state.lock().await.builds.get(&id.value()).cloned())
  }

  async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Build>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .await
        .builds
        .values()
        .filter(|b| b.event_id == event_id)
        .cloned()
        .collect(),
    )
  }

  async fn latest_builds_for_group(&self, group_event_id: EventId) -> Result<Vec<Build>, StoreError> {
    let state = self.state.lock().await;
    let member_event_ids: Vec<EventId> = state
      .events
      .values()
      .filter(|e| e.group_event_id == group_event_id)
      .map(|e| e.id)
      .collect();

    let mut latest: HashMap<u64, Build> = HashMap::new();
    for build in state.builds.values().filter(|b| member_event_ids.contains(&b.event_id)) {
      latest
        .entry(build.job_id.value())
        .and_modify(|existing| {
          if build.created_at > existing.created_at {
            *existing = build.clone();
          }
        })
        .or_insert_with(|| build.clone());
    }
    Ok(latest.into_values().collect())
  }

  async fn list_for_job_and_event(&self, job_id: JobId, event_id: EventId) -> Result<Vec<Build>, StoreError> {
    let state = self.state.lock().await;
    let mut matching: Vec<Build> = state
      .builds
      .values()
      .filter(|b| b.job_id == job_id && b.event_id == event_id)
      .cloned()
      .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(matching)
  }

  async fn create(&self, payload: CreateBuildPayload) -> Result<Build, StoreError> {
    let mut state = self.state.lock().await;
    let id = BuildId::new(state.next_build_id);
    state.next_build_id += 1;
    let build = Build::with_single_parent(
      id,
      payload.event_id,
      payload.job_id,
      payload.sha,
      payload.parent_build_id.first().copied().unwrap_or(id),
      payload.parent_builds,
      chrono::Utc::now(),
    );
    state.builds.insert(id.value(), build.clone());
    Ok(build)
  }

  async fn update(&self, build: &Build) -> Result<Build, StoreError> {
    let mut state = self.state.lock().await;
    state.builds.insert(build.id.value(), build.clone());
    Ok(build.clone())
  }

  async fn start(&self, id: BuildId) -> Result<Build, StoreError> {
    let state = self.state.lock().await;
    state.builds.get(&id.value()).cloned().ok_or(StoreError::NotFound {
      kind: "build",
      id: id.to_string(),
    })
  }

  async fn remove(&self, id: BuildId) -> Result<(), StoreError> {
    self.state.lock().await.builds.remove(&id.value());
    Ok(())
  }
}
