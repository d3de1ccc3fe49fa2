//! Join completeness evaluation.
//!
//! Given a build's parent-builds ledger and the list of names its join
//! requires, decides whether the join is `done` and whether any parent
//! poisoned it with a failure.

use conveyor_model::{BuildStatus, ParentBuilds, PipelineId};
use conveyor_store::{BuildFactory, StoreError};
use conveyor_trigger_name::classify;

/// Result of evaluating a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinOutcome {
  pub done: bool,
  pub has_failure: bool,
}

/// Evaluate whether every name in `join_list` has reported into `ledger`,
/// and whether any of them failed.
///
/// `UNSTABLE` counts as both terminal and a failure: it satisfies "no
/// longer running" but still poisons the join, matching the policy that an
/// unstable build must never start anything downstream.
pub async fn evaluate(
  ledger: &ParentBuilds,
  join_list: &[String],
  current_pipeline_id: PipelineId,
  builds: &dyn BuildFactory,
) -> Result<JoinOutcome, StoreError> {
  let mut outcome = JoinOutcome { done: true, has_failure: false };
  let mut pending_loads = Vec::new();

  for name in join_list {
    let trigger_ref = classify(name, current_pipeline_id);
    let build_id = ledger
      .get(trigger_ref.pipeline_id)
      .and_then(|contribution| contribution.job(&trigger_ref.job_name));

    match build_id {
      Some(id) => pending_loads.push(id),
      None => outcome.done = false,
    }
  }

  let loaded = futures::future::try_join_all(pending_loads.iter().map(|id| builds.get(*id))).await?;

  for build in loaded.into_iter().flatten() {
    if build.status.is_failure() {
      outcome.has_failure = true;
    }
    if !build.status.is_terminal() {
      outcome.done = false;
    }
  }

  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use conveyor_model::{Build, BuildId, EventId, JobId};
  use conveyor_store::CreateBuildPayload;
  use std::collections::HashMap;
  use tokio::sync::Mutex;

  struct FakeBuilds(Mutex<HashMap<u64, Build>>);

  impl FakeBuilds {
    fn new(builds: Vec<Build>) -> Self {
      Self(Mutex::new(builds.into_iter().map(|b| (b.id.value(), b)).collect()))
    }
  }

  #[async_trait]
  impl BuildFactory for FakeBuilds {
    async fn get(&self, id: BuildId) -> Result<Option<Build>, StoreError> {
      Ok(self.0.lock().await.get(&id.value()).cloned())
    }
    async fn list_for_event(&self, _event_id: EventId) -> Result<Vec<Build>, StoreError> {
      Ok(self.0.lock().await.values().cloned().collect())
    }
    async fn latest_builds_for_group(&self, _group_event_id: EventId) -> Result<Vec<Build>, StoreError> {
      Ok(vec![])
    }
    async fn list_for_job_and_event(&self, _job_id: JobId, _event_id: EventId) -> Result<Vec<Build>, StoreError> {
      Ok(vec![])
    }
    async fn create(&self, _payload: CreateBuildPayload) -> Result<Build, StoreError> {
      unimplemented!()
    }
    async fn update(&self, build: &Build) -> Result<Build, StoreError> {
      Ok(build.clone())
    }
    async fn start(&self, _id: BuildId) -> Result<Build, StoreError> {
      unimplemented!()
    }
    async fn remove(&self, _id: BuildId) -> Result<(), StoreError> {
      Ok(())
    }
  }

  fn build(id: u64, status: BuildStatus) -> Build {
    Build {
      id: BuildId::new(id),
      event_id: EventId::new(1),
      job_id: JobId::new(1),
      status,
      sha: "deadbeef".into(),
      parent_build_id: vec![],
      parent_builds: ParentBuilds::new(),
      created_at: chrono::Utc::now(),
    }
  }

  fn pid(n: u64) -> PipelineId {
    PipelineId::new(n)
  }

  #[tokio::test]
  async fn join_not_done_when_entry_missing() {
    let ledger = conveyor_ledger::join_skeleton(pid(1), &["B".to_string(), "C".to_string()]);
    let builds = FakeBuilds::new(vec![]);
    let outcome = evaluate(&ledger, &["B".to_string(), "C".to_string()], pid(1), &builds)
      .await
      .unwrap();
    assert!(!outcome.done);
    assert!(!outcome.has_failure);
  }

  #[tokio::test]
  async fn join_done_when_all_succeed() {
    let mut ledger = conveyor_ledger::join_skeleton(pid(1), &["B".to_string(), "C".to_string()]);
    ledger.entry(pid(1)).set_job("B", Some(BuildId::new(20)));
    ledger.entry(pid(1)).set_job("C", Some(BuildId::new(21)));
    let builds = FakeBuilds::new(vec![build(20, BuildStatus::Success), build(21, BuildStatus::Success)]);

    let outcome = evaluate(&ledger, &["B".to_string(), "C".to_string()], pid(1), &builds)
      .await
      .unwrap();
    assert!(outcome.done);
    assert!(!outcome.has_failure);
  }

  #[tokio::test]
  async fn join_done_with_failure_when_one_fails() {
    let mut ledger = conveyor_ledger::join_skeleton(pid(1), &["B".to_string(), "C".to_string()]);
    ledger.entry(pid(1)).set_job("B", Some(BuildId::new(20)));
    ledger.entry(pid(1)).set_job("C", Some(BuildId::new(21)));
    let builds = FakeBuilds::new(vec![build(20, BuildStatus::Success), build(21, BuildStatus::Failure)]);

    let outcome = evaluate(&ledger, &["B".to_string(), "C".to_string()], pid(1), &builds)
      .await
      .unwrap();
    assert!(outcome.done);
    assert!(outcome.has_failure);
  }

  #[tokio::test]
  async fn join_not_done_while_still_running() {
    let mut ledger = conveyor_ledger::join_skeleton(pid(1), &["B".to_string()]);
    ledger.entry(pid(1)).set_job("B", Some(BuildId::new(20)));
    let builds = FakeBuilds::new(vec![build(20, BuildStatus::Running)]);

    let outcome = evaluate(&ledger, &["B".to_string()], pid(1), &builds)
      .await
      .unwrap();
    assert!(!outcome.done);
  }

  #[tokio::test]
  async fn unstable_counts_as_terminal_and_failure() {
    let mut ledger = conveyor_ledger::join_skeleton(pid(1), &["B".to_string()]);
    ledger.entry(pid(1)).set_job("B", Some(BuildId::new(20)));
    let builds = FakeBuilds::new(vec![build(20, BuildStatus::Unstable)]);

    let outcome = evaluate(&ledger, &["B".to_string()], pid(1), &builds)
      .await
      .unwrap();
    assert!(outcome.done);
    assert!(outcome.has_failure);
  }
}
