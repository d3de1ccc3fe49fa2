//! Collaborator contracts.
//!
//! Persistence and source control are collaborators here, not logic: plain
//! `async_trait` traits the engine is generic over, never a concrete
//! database. `conveyor-testkit` provides in-memory implementations for
//! tests and the demo CLI.

mod build_factory;
mod error;
mod event_factory;
mod job_factory;
mod payloads;
mod pipeline_factory;
mod scm;

pub use build_factory::BuildFactory;
pub use error::StoreError;
pub use event_factory::EventFactory;
pub use job_factory::JobFactory;
pub use payloads::{CreateBuildPayload, CreateEventPayload};
pub use pipeline_factory::PipelineFactory;
pub use scm::{Scm, SecretToken};
