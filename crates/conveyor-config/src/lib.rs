//! Engine-wide configuration.
//!
//! Mirrors the shape of `fuschia-engine::EngineConfig` / `fuschia_config::WorkflowDef`
//! — a small, `serde`-deserializable settings struct constructed once by the
//! composition root and threaded through the engine.

use serde::{Deserialize, Serialize};

/// Bounded retry policy for the optimistic-concurrency ledger update
/// described in `spec.md` §5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
  pub max_attempts: u32,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 3 }
  }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
  /// Whether a PR build chains into further PR-form downstream jobs by
  /// default (`workflowParser.getNextJobs`'s `chainPR` parameter, spec §4).
  #[serde(default)]
  pub chain_pr: bool,

  /// Retry policy for `updateParentBuilds`'s re-read-and-merge loop.
  #[serde(default)]
  pub retry: RetryPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      chain_pr: false,
      retry: RetryPolicy::default(),
    }
  }
}
