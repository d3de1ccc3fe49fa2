use std::fmt;

use async_trait::async_trait;

use crate::error::StoreError;

/// A short-lived source-control token.
///
/// Scoped to a single event-creation call and never logged or cached (spec
/// §5's shared-resource policy) — the `Debug` impl is overridden so an
/// accidental `{:?}` in a log statement can't leak it.
pub struct SecretToken(String);

impl SecretToken {
  pub fn new(token: impl Into<String>) -> Self {
    Self(token.into())
  }

  pub fn reveal(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for SecretToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("<redacted>")
  }
}

/// Source-control operations the engine needs to mint events (`scm` on
/// `spec.md` §6). Committed SHA lookup is an interface here, not logic —
/// the engine never inspects a repository itself.
#[async_trait]
pub trait Scm: Send + Sync {
  /// Unseal a short-lived token for `username` (the pipeline admin).
  async fn unseal_token(&self, username: &str) -> Result<SecretToken, StoreError>;

  /// Resolve the current commit sha for a repository.
  async fn get_commit_sha(
    &self,
    scm_context: &str,
    scm_uri: &str,
    token: &SecretToken,
  ) -> Result<String, StoreError>;
}
