//! The downstream trigger engine.
//!
//! Ties the ledger, join evaluator, and collaborator contracts together
//! into the four components `spec.md` §4 describes as one system:
//! next-build resolution, external re-entry, lifecycle actions, and the
//! orchestrator that dispatches a build's downstream fan-out.

mod collaborators;
mod error;
mod helpers;
mod lifecycle;
mod orchestrator;
mod reentry;
mod resolver;

pub use collaborators::Collaborators;
pub use error::EngineError;
pub use orchestrator::{TriggerEventConfig, TriggerOrchestrator};

// Re-exported so a caller wiring up a `Collaborators` doesn't need a direct
// dependency on every crate that contributes a collaborator trait.
pub use conveyor_join::JoinOutcome;
pub use conveyor_store::{BuildFactory, EventFactory, JobFactory, PipelineFactory, Scm, SecretToken};
