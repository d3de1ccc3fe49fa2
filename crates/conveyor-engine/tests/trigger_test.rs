//! End-to-end scenarios for `TriggerOrchestrator::trigger_next_jobs`, driven
//! against `conveyor_testkit`'s in-memory factories. One test per scenario
//! in the trigger-decision catalogue: sequential internal, both shapes of
//! AND-join, an OR-trigger, and both shapes of cross-pipeline fan-out.

use std::sync::Arc;

use conveyor_config::EngineConfig;
use conveyor_engine::{Collaborators, TriggerOrchestrator};
use conveyor_model::{
  Admin, Build, BuildId, BuildStatus, DefaultWorkflowParser, Edge, Event, EventId, Job, JobId, JobState, Node,
  ParentBuilds, Pipeline, PipelineId, WorkflowGraph,
};
use conveyor_testkit::{FakeScm, InMemoryStore};

fn node(id: &str, name: &str) -> Node {
  Node { id: id.to_string(), name: name.to_string() }
}

fn edge(src: &str, dest: &str, join: bool) -> Edge {
  Edge { src: src.to_string(), dest: dest.to_string(), join }
}

fn pipeline(id: u64) -> Pipeline {
  Pipeline {
    id: PipelineId::new(id),
    scm_context: "github:github.com".to_string(),
    scm_uri: format!("github.com/org/repo-{id}"),
    config_pipeline_id: None,
    admin: Admin { username: format!("admin-{id}") },
  }
}

fn job(id: u64, pipeline_id: u64, name: &str) -> Job {
  Job { id: JobId::new(id), pipeline_id: PipelineId::new(pipeline_id), name: name.to_string(), state: JobState::Enabled }
}

fn event(id: u64, pipeline_id: u64, graph: WorkflowGraph, parent_event_id: Option<u64>, group_event_id: u64) -> Event {
  Event {
    id: EventId::new(id),
    pipeline_id: PipelineId::new(pipeline_id),
    workflow_graph: graph,
    sha: "deadbeef".to_string(),
    config_pipeline_sha: None,
    parent_event_id: parent_event_id.map(EventId::new),
    group_event_id: EventId::new(group_event_id),
    base_branch: None,
    pr: None,
  }
}

fn build(id: u64, event_id: u64, job_id: u64, status: BuildStatus, parent_builds: ParentBuilds) -> Build {
  Build {
    id: BuildId::new(id),
    event_id: EventId::new(event_id),
    job_id: JobId::new(job_id),
    status,
    sha: "deadbeef".to_string(),
    parent_build_id: Vec::new(),
    parent_builds,
    created_at: chrono::Utc::now(),
  }
}

fn orchestrator(store: Arc<InMemoryStore>) -> TriggerOrchestrator {
  TriggerOrchestrator::new(Collaborators {
    pipelines: store.clone(),
    jobs: store.clone(),
    events: store.clone(),
    builds: store.clone(),
    scm: Arc::new(FakeScm),
    parser: Arc::new(DefaultWorkflowParser),
    config: EngineConfig::default(),
  })
}

async fn fetch_build(store: &InMemoryStore, id: BuildId) -> Option<Build> {
  conveyor_engine::BuildFactory::get(store, id).await.expect("build read failed")
}

async fn builds_for_event(store: &InMemoryStore, id: EventId) -> Vec<Build> {
  conveyor_engine::BuildFactory::list_for_event(store, id).await.expect("build list failed")
}

async fn fetch_event(store: &InMemoryStore, id: EventId) -> Event {
  conveyor_engine::EventFactory::get(store, id)
    .await
    .expect("event read failed")
    .expect("event must exist")
}

#[tokio::test]
async fn s1_sequential_internal() {
  let graph = WorkflowGraph::new(vec![node("1", "A"), node("2", "B")], vec![edge("1", "2", false)]);

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph.clone()).await;
  store.seed_job(job(1, 1, "A")).await;
  store.seed_job(job(2, 1, "B")).await;
  store.seed_event(event(100, 1, graph, None, 100)).await;

  let build10 = build(10, 100, 1, BuildStatus::Success, ParentBuilds::new());

  let triggered = orchestrator(store).trigger_next_jobs(&build10).await.expect("trigger_next_jobs failed");

  assert_eq!(triggered.len(), 1);
  let b = &triggered[0];
  assert_eq!(b.job_id, JobId::new(2));
  assert_eq!(b.status, BuildStatus::Queued);
  assert_eq!(b.parent_build_id, vec![BuildId::new(10)]);
  let contribution = b.parent_builds.get(PipelineId::new(1)).expect("pipeline 1 contribution");
  assert_eq!(contribution.event_id, Some(EventId::new(100)));
  assert_eq!(contribution.job("A"), Some(BuildId::new(10)));
}

#[tokio::test]
async fn s2_and_join_all_success() {
  let graph = WorkflowGraph::new(
    vec![node("1", "B"), node("2", "C"), node("3", "D")],
    vec![edge("1", "3", true), edge("2", "3", true)],
  );

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph.clone()).await;
  store.seed_job(job(1, 1, "B")).await;
  store.seed_job(job(2, 1, "C")).await;
  store.seed_job(job(3, 1, "D")).await;
  store.seed_event(event(100, 1, graph, None, 100)).await;

  let build20 = build(20, 100, 1, BuildStatus::Success, ParentBuilds::new());
  let build21 = build(21, 100, 2, BuildStatus::Success, ParentBuilds::new());
  store.seed_build(build20.clone()).await;
  store.seed_build(build21.clone()).await;

  let orchestrator = orchestrator(store.clone());

  let first = orchestrator.trigger_next_jobs(&build20).await.expect("B's trigger failed");
  assert!(first.is_empty(), "D should not start until C also reports in");

  let after_first = builds_for_event(&store, EventId::new(100)).await;
  let d_build = after_first.iter().find(|b| b.job_id == JobId::new(3)).expect("D build created");
  assert_eq!(d_build.status, BuildStatus::Created);
  let contribution = d_build.parent_builds.get(PipelineId::new(1)).unwrap();
  assert_eq!(contribution.job("B"), Some(BuildId::new(20)));
  assert_eq!(contribution.job("C"), None);
  assert!(contribution.has_job("C"));
  let d_id = d_build.id;

  let second = orchestrator.trigger_next_jobs(&build21).await.expect("C's trigger failed");
  assert_eq!(second.len(), 1);
  assert_eq!(second[0].id, d_id);
  assert_eq!(second[0].status, BuildStatus::Queued);
  let contribution = second[0].parent_builds.get(PipelineId::new(1)).unwrap();
  assert_eq!(contribution.job("B"), Some(BuildId::new(20)));
  assert_eq!(contribution.job("C"), Some(BuildId::new(21)));
}

#[tokio::test]
async fn s3_and_join_one_failure() {
  let graph = WorkflowGraph::new(
    vec![node("1", "B"), node("2", "C"), node("3", "D")],
    vec![edge("1", "3", true), edge("2", "3", true)],
  );

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph.clone()).await;
  store.seed_job(job(1, 1, "B")).await;
  store.seed_job(job(2, 1, "C")).await;
  store.seed_job(job(3, 1, "D")).await;
  store.seed_event(event(100, 1, graph, None, 100)).await;

  let build20 = build(20, 100, 1, BuildStatus::Success, ParentBuilds::new());
  let build21 = build(21, 100, 2, BuildStatus::Failure, ParentBuilds::new());
  store.seed_build(build20.clone()).await;
  store.seed_build(build21.clone()).await;

  let orchestrator = orchestrator(store.clone());

  let first = orchestrator.trigger_next_jobs(&build20).await.expect("B's trigger failed");
  assert!(first.is_empty());

  let after_first = builds_for_event(&store, EventId::new(100)).await;
  let d_id = after_first.iter().find(|b| b.job_id == JobId::new(3)).expect("D build created").id;

  let second = orchestrator.trigger_next_jobs(&build21).await.expect("C's trigger failed");
  assert!(second.is_empty(), "a poisoned join must not start D");

  let removed = fetch_build(&store, d_id).await;
  assert!(removed.is_none(), "D must be removed once its join is poisoned");
}

#[tokio::test]
async fn s4_or_trigger() {
  // B -> D is an AND-join member; C -> D is a plain OR edge. D triggered off
  // C alone must not wait on B.
  let graph = WorkflowGraph::new(
    vec![node("1", "B"), node("2", "C"), node("3", "D")],
    vec![edge("1", "3", true), edge("2", "3", false)],
  );

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph.clone()).await;
  store.seed_job(job(1, 1, "B")).await;
  store.seed_job(job(2, 1, "C")).await;
  store.seed_job(job(3, 1, "D")).await;
  store.seed_event(event(100, 1, graph, None, 100)).await;

  let build30 = build(30, 100, 2, BuildStatus::Success, ParentBuilds::new());

  let triggered = orchestrator(store).trigger_next_jobs(&build30).await.expect("C's trigger failed");

  assert_eq!(triggered.len(), 1);
  let d = &triggered[0];
  assert_eq!(d.job_id, JobId::new(3));
  assert_eq!(d.status, BuildStatus::Queued);

  let contribution = d.parent_builds.get(PipelineId::new(1)).unwrap();
  assert_eq!(contribution.job("C"), Some(BuildId::new(30)));
  assert!(!contribution.has_job("B"), "an OR-trigger only carries its own contribution");
}

#[tokio::test]
async fn s5_external_fan_out_straight() {
  // Pipeline 1: A -> sd@2:X, a plain (OR) edge.
  let graph1 = WorkflowGraph::new(vec![node("1", "A"), node("2", "sd@2:X")], vec![edge("1", "2", false)]);
  // Pipeline 2: a placeholder node for the upstream trigger, feeding X.
  let graph2 = WorkflowGraph::new(vec![node("1", "sd@1:A"), node("2", "X")], vec![edge("1", "2", false)]);

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph1.clone()).await;
  store.seed_pipeline(pipeline(2), graph2).await;
  store.seed_job(job(1, 1, "A")).await;
  store.seed_job(job(2, 2, "X")).await;
  store.seed_event(event(100, 1, graph1, None, 100)).await;

  let build40 = build(40, 100, 1, BuildStatus::Success, ParentBuilds::new());

  let triggered = orchestrator(store.clone()).trigger_next_jobs(&build40).await.expect("A's trigger failed");

  assert_eq!(triggered.len(), 1);
  let x = &triggered[0];
  assert_eq!(x.job_id, JobId::new(2));
  assert_eq!(x.status, BuildStatus::Queued);
  assert_eq!(x.parent_build_id, vec![BuildId::new(40)]);

  let new_event = fetch_event(&store, x.event_id).await;
  assert_eq!(new_event.parent_event_id, Some(EventId::new(100)));
  assert_eq!(new_event.sha, format!("sha-{}", pipeline(2).scm_uri));

  let contribution = x.parent_builds.get(PipelineId::new(1)).unwrap();
  assert_eq!(contribution.job("A"), Some(BuildId::new(40)));
}

#[tokio::test]
async fn s6_external_reentry_join() {
  // Pipeline 2's own graph defines Y's real join: the upstream placeholder
  // `sd@1:A` and the sibling internal job `X`.
  let graph2 = WorkflowGraph::new(
    vec![node("1", "sd@1:A"), node("2", "X"), node("3", "Y")],
    vec![edge("1", "3", true), edge("2", "3", true)],
  );
  // Pipeline 1's own graph only knows it triggers `sd@2:Y` off `A`, an
  // ordinary (OR) edge — the cross-pipeline join lives in pipeline 2.
  let graph1 = WorkflowGraph::new(vec![node("1", "A"), node("2", "sd@2:Y")], vec![edge("1", "2", false)]);

  let store = Arc::new(InMemoryStore::new());
  store.seed_pipeline(pipeline(1), graph1.clone()).await;
  store.seed_pipeline(pipeline(2), graph2.clone()).await;
  store.seed_job(job(1, 1, "A")).await;
  store.seed_job(job(2, 2, "X")).await;
  store.seed_job(job(3, 2, "Y")).await;

  store.seed_event(event(200, 2, graph2, None, 200)).await;
  let build30 = build(30, 200, 2, BuildStatus::Success, ParentBuilds::new());
  store.seed_build(build30).await;

  let mut pending_y_ledger = ParentBuilds::new();
  pending_y_ledger.entry(PipelineId::new(1)).set_job("A", None);
  pending_y_ledger.entry(PipelineId::new(2)).set_job("X", None);
  let build_y = build(40, 200, 3, BuildStatus::Created, pending_y_ledger);
  store.seed_build(build_y.clone()).await;

  // Build 10's own ledger already recorded pipeline 2's contribution from
  // an earlier re-entry (X's completion).
  let mut reentry_ledger = ParentBuilds::new();
  reentry_ledger.entry(PipelineId::new(2)).event_id = Some(EventId::new(200));
  reentry_ledger.entry(PipelineId::new(2)).set_job("X", Some(BuildId::new(30)));
  store.seed_event(event(100, 1, graph1, None, 100)).await;
  let build10 = build(10, 100, 1, BuildStatus::Success, reentry_ledger);
  store.seed_build(build10.clone()).await;

  let triggered = orchestrator(store).trigger_next_jobs(&build10).await.expect("A's trigger failed");

  assert_eq!(triggered.len(), 1);
  let y = &triggered[0];
  assert_eq!(y.id, build_y.id);
  assert_eq!(y.status, BuildStatus::Queued);

  let a_contribution = y.parent_builds.get(PipelineId::new(1)).unwrap();
  assert_eq!(a_contribution.job("A"), Some(BuildId::new(10)));
  let x_contribution = y.parent_builds.get(PipelineId::new(2)).unwrap();
  assert_eq!(x_contribution.job("X"), Some(BuildId::new(30)));
}
