use async_trait::async_trait;
use conveyor_model::{Job, JobId, PipelineId};

use crate::error::StoreError;

/// Loads jobs, split into two explicit lookups rather than a single
/// "by id or by filter object" call.
#[async_trait]
pub trait JobFactory: Send + Sync {
  async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, StoreError>;
  async fn get_by_name(&self, pipeline_id: PipelineId, name: &str) -> Result<Option<Job>, StoreError>;
}
