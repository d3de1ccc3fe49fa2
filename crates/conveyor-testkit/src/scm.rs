use async_trait::async_trait;
use conveyor_store::{Scm, SecretToken, StoreError};

/// A source-control fake that mints a deterministic sha from the uri it was
/// asked about, so fixtures and assertions don't need a real repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeScm;

#[async_trait]
impl Scm for FakeScm {
  async fn unseal_token(&self, username: &str) -> Result<SecretToken, StoreError> {
    Ok(SecretToken::new(format!("token-for-{username}")))
  }

  async fn get_commit_sha(&self, _scm_context: &str, scm_uri: &str, _token: &SecretToken) -> Result<String, StoreError> {
    Ok(format!("sha-{scm_uri}"))
  }
}
