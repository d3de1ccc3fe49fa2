use conveyor_model::{Build, BuildId, Event, Job, Pipeline, PipelineId, WorkflowGraph};
use serde::{Deserialize, Serialize};

use crate::store::InMemoryStore;

/// A JSON-deserializable scenario: enough seed data to build an
/// [`InMemoryStore`] and a build id to feed into the trigger orchestrator.
///
/// This is the shape the demo CLI (`conveyor run --fixture <path>`) reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
  pub pipelines: Vec<PipelineFixture>,
  #[serde(default)]
  pub jobs: Vec<Job>,
  #[serde(default)]
  pub events: Vec<Event>,
  #[serde(default)]
  pub builds: Vec<Build>,
  pub trigger_build_id: BuildId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFixture {
  #[serde(flatten)]
  pub pipeline: Pipeline,
  pub graph: WorkflowGraph,
}

impl Fixture {
  /// Seed a fresh [`InMemoryStore`] with everything this fixture describes.
  pub async fn load(&self) -> InMemoryStore {
    let store = InMemoryStore::new();
    for entry in &self.pipelines {
      store.seed_pipeline(entry.pipeline.clone(), entry.graph.clone()).await;
    }
    for job in &self.jobs {
      store.seed_job(job.clone()).await;
    }
    for event in &self.events {
      store.seed_event(event.clone()).await;
    }
    for build in &self.builds {
      store.seed_build(build.clone()).await;
    }
    store
  }
}

/// Used only by tests/fixtures that want a stable pipeline id without
/// importing `conveyor_trigger_name` directly.
pub fn pipeline_id(n: u64) -> PipelineId {
  PipelineId::new(n)
}
