use async_trait::async_trait;
use conveyor_model::{Job, Pipeline, PipelineId};

use crate::error::StoreError;

/// Loads pipelines and the jobs that belong to them.
#[async_trait]
pub trait PipelineFactory: Send + Sync {
  async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>, StoreError>;

  /// All jobs declared on this pipeline (`Pipeline.getJobs` in `spec.md` §6).
  async fn get_jobs(&self, pipeline_id: PipelineId) -> Result<Vec<Job>, StoreError>;
}
