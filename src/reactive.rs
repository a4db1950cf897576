//! Reactive facade variant.
//!
//! Some hosts keep their credential store behind an async boundary (a
//! database pool, a remote service). This module carries the same
//! repository contract with deferred results and a facade whose
//! user-scoped operations await it; every other semantic — code
//! derivation, windows, error surface — is exactly the sync facade's.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
  authenticator::Authenticator,
  config::AuthenticatorConfig,
  credentials::Credentials,
  error::KeystepResult,
};

/// [`CredentialRepository`](crate::store::CredentialRepository) counterpart
/// whose operations resolve asynchronously.
#[async_trait]
pub trait AsyncCredentialRepository: Send + Sync {
  /// Retrieve the encoded secret of `user_name`.
  async fn secret_key(&self, user_name: &str) -> KeystepResult<String>;

  /// Persist freshly minted credentials for `user_name`.
  async fn save_credentials(
    &self,
    user_name: &str,
    secret_key: &str,
    validation_code: u32,
    scratch_codes: &[u32],
  ) -> KeystepResult<()>;
}

/// Facade over [`Authenticator`] bound to an async repository.
pub struct ReactiveAuthenticator {
  inner:      Authenticator,
  repository: Arc<dyn AsyncCredentialRepository>,
}

impl ReactiveAuthenticator {
  /// Build a reactive facade over `config` and `repository`.
  pub fn new(config: AuthenticatorConfig, repository: Arc<dyn AsyncCredentialRepository>) -> Self {
    Self { inner: Authenticator::new(config), repository }
  }

  /// The wrapped sync facade, for the operations that never touch the
  /// repository.
  pub fn authenticator(&self) -> &Authenticator { &self.inner }

  /// Mint a new credential set and persist it for `user_name`.
  pub async fn create_credentials_for(&self, user_name: &str) -> KeystepResult<Credentials> {
    let credentials = self.inner.create_credentials()?;
    self
      .repository
      .save_credentials(
        user_name,
        credentials.key(),
        credentials.verification_code(),
        credentials.scratch_codes(),
      )
      .await?;

    Ok(credentials)
  }

  /// The current TOTP code of `user_name`.
  pub async fn totp_password_of_user(&self, user_name: &str) -> KeystepResult<u32> {
    let secret = self.repository.secret_key(user_name).await?;
    self.inner.totp_password(&secret)
  }

  /// The TOTP code of `user_name` at `time_ms`.
  pub async fn totp_password_of_user_at(
    &self,
    user_name: &str,
    time_ms: u64,
  ) -> KeystepResult<u32> {
    let secret = self.repository.secret_key(user_name).await?;
    self.inner.totp_password_at(&secret, time_ms)
  }

  /// Verify `code` for `user_name` at the current time.
  pub async fn authorize_user(&self, user_name: &str, code: u32) -> KeystepResult<bool> {
    let secret = self.repository.secret_key(user_name).await?;
    self.inner.authorize(&secret, code)
  }

  /// Verify `code` for `user_name` at `time_ms`.
  pub async fn authorize_user_at(
    &self,
    user_name: &str,
    code: u32,
    time_ms: u64,
  ) -> KeystepResult<bool> {
    let secret = self.repository.secret_key(user_name).await?;
    self.inner.authorize_at(&secret, code, time_ms)
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use super::*;
  use crate::error::KeystepError;

  #[derive(Default)]
  struct AsyncMapRepository {
    secrets: Mutex<HashMap<String, String>>,
  }

  #[async_trait]
  impl AsyncCredentialRepository for AsyncMapRepository {
    async fn secret_key(&self, user_name: &str) -> KeystepResult<String> {
      self
        .secrets
        .lock()
        .unwrap()
        .get(user_name)
        .cloned()
        .ok_or_else(|| KeystepError::UnknownUser(user_name.to_string()))
    }

    async fn save_credentials(
      &self,
      user_name: &str,
      secret_key: &str,
      _validation_code: u32,
      _scratch_codes: &[u32],
    ) -> KeystepResult<()> {
      self.secrets.lock().unwrap().insert(user_name.to_string(), secret_key.to_string());
      Ok(())
    }
  }

  #[tokio::test]
  async fn enrolment_and_verification() {
    let repository = Arc::new(AsyncMapRepository::default());
    let auth = ReactiveAuthenticator::new(AuthenticatorConfig::default(), repository);

    let credentials = auth.create_credentials_for("alice").await.unwrap();

    let t = 1_700_000_000_000;
    let code = auth.totp_password_of_user_at("alice", t).await.unwrap();
    assert_eq!(code, auth.authenticator().totp_password_at(credentials.key(), t).unwrap());
    if code != 0 {
      assert!(auth.authorize_user_at("alice", code, t).await.unwrap());
    }
  }

  #[tokio::test]
  async fn unknown_user_propagates() {
    let repository = Arc::new(AsyncMapRepository::default());
    let auth = ReactiveAuthenticator::new(AuthenticatorConfig::default(), repository);

    assert!(matches!(
      auth.totp_password_of_user("nobody").await,
      Err(KeystepError::UnknownUser(name)) if name == "nobody"
    ));
    assert!(matches!(
      auth.authorize_user("nobody", 123456).await,
      Err(KeystepError::UnknownUser(_))
    ));
  }

  #[tokio::test]
  async fn sync_operations_are_unchanged() {
    let repository = Arc::new(AsyncMapRepository::default());
    let auth = ReactiveAuthenticator::new(AuthenticatorConfig::default(), repository);

    // Base32 of the RFC 6238 reference secret; 94287082 mod 10^6.
    let code = auth
      .authenticator()
      .totp_password_at("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ", 59_000)
      .unwrap();
    assert_eq!(code, 287082);
  }
}
