use thiserror::Error;

/// Errors a collaborator (factory or source-control) call can fail with.
///
/// This is deliberately narrower than `conveyor-engine::EngineError` — the
/// engine maps every variant here into its own error type via `#[from]`.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{kind} not found: {id}")]
  NotFound { kind: &'static str, id: String },

  #[error("downstream persistence failed: {0}")]
  Persistence(String),

  #[error("source control call failed: {0}")]
  ScmFailure(String),

  /// An optimistic-concurrency write lost a race with another writer.
  /// Callers retry a bounded number of times before surfacing this upward.
  #[error("concurrent write conflict on {kind} {id}")]
  Conflict { kind: &'static str, id: String },
}
