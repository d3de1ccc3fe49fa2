//! In-memory collaborator fakes.
//!
//! One [`InMemoryStore`] backs every factory trait `conveyor-store` defines,
//! plus a `FakeScm`, so tests and the demo CLI can assemble a full
//! `conveyor_engine::Collaborators` without a real database or repository.

mod fixture;
mod scm;
mod store;

pub use fixture::{pipeline_id, Fixture, PipelineFixture};
pub use scm::FakeScm;
pub use store::InMemoryStore;
