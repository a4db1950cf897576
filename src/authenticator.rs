//! The facade: credential creation, TOTP derivation, and verification.

use std::{
  sync::{Arc, OnceLock},
  time::{SystemTime, UNIX_EPOCH},
};

pub use crate::config::MAX_WINDOW;
use crate::{
  config::AuthenticatorConfig,
  credentials::{self, Credentials},
  error::{KeystepError, KeystepResult},
  hotp::hotp_code,
  rng::ReseedingRng,
  store::{self, CredentialRepository},
};

/// The server-side authenticator.
///
/// Carries one configuration, one reseeding CSPRNG, and an optional
/// credential repository. All operations are safe to call concurrently
/// from multiple threads on the same instance.
pub struct Authenticator {
  config:     AuthenticatorConfig,
  rng:        ReseedingRng,
  repository: OnceLock<Option<Arc<dyn CredentialRepository>>>,
}

impl Default for Authenticator {
  fn default() -> Self { Self::new(AuthenticatorConfig::default()) }
}

impl Authenticator {
  /// Build a facade over `config`. User-scoped operations will discover a
  /// repository through [`store::register_repository`], once, on first
  /// use.
  pub fn new(config: AuthenticatorConfig) -> Self {
    Self { config, rng: ReseedingRng::new(), repository: OnceLock::new() }
  }

  /// Build a facade bound to an explicit repository, overriding discovery.
  pub fn with_repository(
    config: AuthenticatorConfig,
    repository: Arc<dyn CredentialRepository>,
  ) -> Self {
    let slot = OnceLock::new();
    let _ = slot.set(Some(repository));
    Self { config, rng: ReseedingRng::new(), repository: slot }
  }

  /// The configuration this facade operates under.
  pub fn config(&self) -> &AuthenticatorConfig { &self.config }

  fn now_ms() -> u64 {
    SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .expect("system clock before the UNIX epoch")
      .as_millis() as u64
  }

  /// The repository bound to this facade: the explicit one if given,
  /// otherwise whatever the process-wide registrar held the first time a
  /// user-scoped operation ran. The lookup result is cached either way.
  fn repository(&self) -> KeystepResult<Arc<dyn CredentialRepository>> {
    self
      .repository
      .get_or_init(store::registered_repository)
      .clone()
      .ok_or(KeystepError::RepositoryNotConfigured)
  }

  /// Mint a new credential set: secret key, validation code at the epoch,
  /// and scratch codes.
  ///
  /// # Errors
  ///
  /// Propagates configuration-class failures from code derivation.
  pub fn create_credentials(&self) -> KeystepResult<Credentials> {
    credentials::generate(&self.config, &self.rng)
  }

  /// Mint a new credential set and persist it for `user_name` through the
  /// configured repository.
  ///
  /// # Errors
  ///
  /// [`KeystepError::RepositoryNotConfigured`] without a repository;
  /// repository failures are propagated.
  pub fn create_credentials_for(&self, user_name: &str) -> KeystepResult<Credentials> {
    let credentials = self.create_credentials()?;
    self.repository()?.save_credentials(
      user_name,
      credentials.key(),
      credentials.verification_code(),
      credentials.scratch_codes(),
    )?;

    Ok(credentials)
  }

  /// The current TOTP code for an encoded secret.
  ///
  /// # Errors
  ///
  /// [`KeystepError::InvalidSecret`] when the secret does not decode.
  pub fn totp_password(&self, secret: &str) -> KeystepResult<u32> {
    self.totp_password_at(secret, Self::now_ms())
  }

  /// The TOTP code for an encoded secret at `time_ms` (milliseconds since
  /// the UNIX epoch).
  ///
  /// # Errors
  ///
  /// [`KeystepError::InvalidSecret`] when the secret does not decode.
  pub fn totp_password_at(&self, secret: &str, time_ms: u64) -> KeystepResult<u32> {
    let key = self.config.key_representation().decode(secret)?;
    hotp_code(
      &key,
      time_ms / self.config.time_step_ms(),
      self.config.hmac_hash(),
      self.config.code_digits(),
    )
  }

  /// The current TOTP code of `user_name`, via the repository.
  pub fn totp_password_of_user(&self, user_name: &str) -> KeystepResult<u32> {
    self.totp_password_of_user_at(user_name, Self::now_ms())
  }

  /// The TOTP code of `user_name` at `time_ms`, via the repository.
  pub fn totp_password_of_user_at(&self, user_name: &str, time_ms: u64) -> KeystepResult<u32> {
    let secret = self.repository()?.secret_key(user_name)?;
    self.totp_password_at(&secret, time_ms)
  }

  /// Verify `code` against an encoded secret at the current time, using
  /// the configured window.
  pub fn authorize(&self, secret: &str, code: u32) -> KeystepResult<bool> {
    self.authorize_at(secret, code, Self::now_ms())
  }

  /// Verify `code` against an encoded secret at `time_ms`, using the
  /// configured window.
  pub fn authorize_at(&self, secret: &str, code: u32, time_ms: u64) -> KeystepResult<bool> {
    self.authorize_with(secret, code, time_ms, self.config.window_size())
  }

  /// Verify `code` against an encoded secret at `time_ms`, scanning
  /// `window` adjacent intervals.
  ///
  /// For a window of `w` intervals the scanned offsets are
  /// `-⌊(w-1)/2⌋ ..= ⌊w/2⌋`: a window of 3 checks {-1, 0, +1}, a window of
  /// 4 checks {-1, 0, +1, +2}. A structurally impossible code (zero, or at
  /// least `10^digits`) yields `false` before any HMAC is computed.
  ///
  /// # Errors
  ///
  /// [`KeystepError::InvalidWindow`] when `window` is outside `[1, 17]`;
  /// [`KeystepError::InvalidSecret`] when the secret does not decode.
  pub fn authorize_with(
    &self,
    secret: &str,
    code: u32,
    time_ms: u64,
    window: u32,
  ) -> KeystepResult<bool> {
    if code == 0 || code >= self.config.code_modulus() {
      return Ok(false);
    }
    if window < 1 || window > MAX_WINDOW {
      return Err(KeystepError::InvalidWindow);
    }

    let key = self.config.key_representation().decode(secret)?;
    let interval = (time_ms / self.config.time_step_ms()) as i64;
    let behind = i64::from((window - 1) / 2);
    let ahead = i64::from(window / 2);

    for i in -behind..=ahead {
      let candidate = hotp_code(
        &key,
        (interval + i) as u64,
        self.config.hmac_hash(),
        self.config.code_digits(),
      )?;
      if candidate == code {
        return Ok(true);
      }
    }

    Ok(false)
  }

  /// Verify `code` for `user_name` at the current time, via the
  /// repository.
  pub fn authorize_user(&self, user_name: &str, code: u32) -> KeystepResult<bool> {
    self.authorize_user_at(user_name, code, Self::now_ms())
  }

  /// Verify `code` for `user_name` at `time_ms`, via the repository.
  pub fn authorize_user_at(
    &self,
    user_name: &str,
    code: u32,
    time_ms: u64,
  ) -> KeystepResult<bool> {
    let secret = self.repository()?.secret_key(user_name)?;
    self.authorize_at(&secret, code, time_ms)
  }
}
