use std::sync::Arc;

use conveyor_config::EngineConfig;
use conveyor_model::WorkflowParser;
use conveyor_store::{BuildFactory, EventFactory, JobFactory, PipelineFactory, Scm};

/// Every collaborator the trigger orchestrator reads or writes through.
///
/// Bundled into one struct so [`crate::TriggerOrchestrator::new`] takes one
/// argument instead of six — the same shape `fuschia-engine`'s runner holds
/// its component registry, resolver, and store in.
pub struct Collaborators {
  pub pipelines: Arc<dyn PipelineFactory>,
  pub jobs: Arc<dyn JobFactory>,
  pub events: Arc<dyn EventFactory>,
  pub builds: Arc<dyn BuildFactory>,
  pub scm: Arc<dyn Scm>,
  pub parser: Arc<dyn WorkflowParser>,
  pub config: EngineConfig,
}
