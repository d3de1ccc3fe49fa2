use async_trait::async_trait;
use conveyor_model::{Build, BuildId, EventId, JobId};

use crate::error::StoreError;
use crate::payloads::CreateBuildPayload;

/// Loads, creates, and mutates builds.
#[async_trait]
pub trait BuildFactory: Send + Sync {
  async fn get(&self, id: BuildId) -> Result<Option<Build>, StoreError>;

  /// All builds belonging to `event_id`.
  async fn list_for_event(&self, event_id: EventId) -> Result<Vec<Build>, StoreError>;

  /// The most recent build per job across every event in a restart
  /// lineage — the source for "parallel builds" in a sibling pipeline's
  /// event.
  async fn latest_builds_for_group(&self, group_event_id: EventId) -> Result<Vec<Build>, StoreError>;

  /// Builds for `job_id` within `event_id`, most recently created first —
  /// used by the external-path resolver to find a pending `CREATED` build.
  /// Callers must await the full list and then take `[0]`; indexing before
  /// awaiting would race against the fetch itself.
  async fn list_for_job_and_event(
    &self,
    job_id: JobId,
    event_id: EventId,
  ) -> Result<Vec<Build>, StoreError>;

  async fn create(&self, payload: CreateBuildPayload) -> Result<Build, StoreError>;

  /// Persist a mutated build (ledger update, status change, parentage).
  async fn update(&self, build: &Build) -> Result<Build, StoreError>;

  /// Promote a `QUEUED` build into the executor queue. Scheduling itself is
  /// out of scope here: this call only flags the build as ready.
  async fn start(&self, id: BuildId) -> Result<Build, StoreError>;

  /// Remove a join-poisoned build. Best-effort: callers log failures here
  /// rather than retrying.
  async fn remove(&self, id: BuildId) -> Result<(), StoreError>;
}
