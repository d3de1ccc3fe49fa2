use async_trait::async_trait;
use conveyor_model::{Event, EventId};

use crate::error::StoreError;
use crate::payloads::CreateEventPayload;

/// Loads and creates events.
#[async_trait]
pub trait EventFactory: Send + Sync {
  async fn get(&self, id: EventId) -> Result<Option<Event>, StoreError>;

  /// Every event sharing this restart lineage's root id.
  async fn list_by_group(&self, group_event_id: EventId) -> Result<Vec<Event>, StoreError>;

  async fn create(&self, payload: CreateEventPayload) -> Result<Event, StoreError>;
}
