use conveyor_model::JobId;
use conveyor_store::StoreError;
use thiserror::Error;

/// Errors the trigger orchestrator and its collaborators can surface.
///
/// `spec.md` §7 treats a disabled job as a non-error (`Ok(None)`, not a
/// variant here) and a `GraphMismatch` during ledger fill as a logged
/// warning, not a failure — only the cases below stop a trigger outright.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("job {0} not found")]
  JobNotFound(JobId),

  #[error("pipeline {0} not found")]
  PipelineNotFound(conveyor_model::PipelineId),

  #[error("event {0} not found")]
  EventNotFound(conveyor_model::EventId),

  /// The re-entry target node isn't present in the external graph at all
  /// (as opposed to a ledger-fill `GraphMismatch`, which is recoverable).
  #[error("no node named '{0}' in the external workflow graph")]
  GraphMismatch(String),

  /// The bounded retry loop in `update_parent_builds` ran out of attempts
  /// without winning the optimistic-concurrency race (spec §5).
  #[error("gave up on a concurrent ledger update after {0} attempts")]
  ConcurrencyConflict(u32),

  #[error(transparent)]
  Factory(#[from] StoreError),
}
