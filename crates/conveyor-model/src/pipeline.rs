use serde::{Deserialize, Serialize};

use crate::PipelineId;

/// A source-control principal capable of minting a token for this pipeline.
///
/// `unseal_token` is a capability, not a field — see `conveyor-store::Scm`
/// for where it's actually called. Modeling it as data here would invite
/// accidentally logging or serializing a secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
  pub username: String,
}

/// A versioned CI configuration tied to a source-control repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
  pub id: PipelineId,
  pub scm_context: String,
  pub scm_uri: String,
  /// The pipeline whose config this one reuses, if any.
  pub config_pipeline_id: Option<PipelineId>,
  pub admin: Admin,
}
