use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{BuildId, EventId, JobId};
use crate::ledger::ParentBuilds;
use crate::status::BuildStatus;

/// One execution of one job within one event.
///
/// `parent_build_id` is modeled uniformly as an ordered list (Design Note
/// §9 in `spec.md`): the inbound, single-parent case is just a
/// one-element list, constructed via [`Build::with_single_parent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
  pub id: BuildId,
  pub event_id: EventId,
  pub job_id: JobId,
  pub status: BuildStatus,
  pub sha: String,
  pub parent_build_id: Vec<BuildId>,
  pub parent_builds: ParentBuilds,
  /// Used to break ties when more than one candidate build matches a
  /// search (callers prefer the most recently created one).
  pub created_at: DateTime<Utc>,
}

impl Build {
  pub fn with_single_parent(
    id: BuildId,
    event_id: EventId,
    job_id: JobId,
    sha: String,
    parent_build_id: BuildId,
    parent_builds: ParentBuilds,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      event_id,
      job_id,
      status: BuildStatus::Created,
      sha,
      parent_build_id: vec![parent_build_id],
      parent_builds,
      created_at,
    }
  }

  /// Prepend a new parent to this build's ancestry, without duplicating an
  /// already-recorded parent (idempotent under redelivery, per spec §9).
  pub fn add_parent(&mut self, parent_build_id: BuildId) {
    if !self.parent_build_id.contains(&parent_build_id) {
      self.parent_build_id.insert(0, parent_build_id);
    }
  }
}
