//! Authenticator configuration: the immutable parameter bundle shared by
//! credential generation, code derivation, and verification.

use data_encoding::{BASE32_NOPAD, BASE64};
use serde::{Deserialize, Serialize};

use crate::{
  error::{KeystepError, KeystepResult},
  hotp::HashAlgorithm,
};

/// Largest admissible verification window, in time-step intervals.
pub const MAX_WINDOW: u32 = 17;

const DEFAULT_CODE_DIGITS: u32 = 6;
const DEFAULT_TIME_STEP_MS: u64 = 30_000;
const DEFAULT_WINDOW_SIZE: u32 = 3;
const DEFAULT_KEY_LENGTH: usize = 10;
const DEFAULT_SCRATCH_CODES: usize = 5;
const MIN_KEY_LENGTH: usize = 10;

/// Encoding used to store and exchange shared secrets.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum KeyRepresentation {
  /// Base32 (RFC 4648), uppercase and unpadded on encode. Decoding
  /// tolerates lowercase input, whitespace, and trailing `=` padding.
  #[serde(rename = "base32")]
  Base32,
  /// Standard padded Base64.
  #[serde(rename = "base64")]
  Base64,
}

impl KeyRepresentation {
  /// Encode a raw secret for storage and provisioning.
  pub fn encode(&self, raw: &[u8]) -> String {
    match self {
      KeyRepresentation::Base32 => BASE32_NOPAD.encode(raw),
      KeyRepresentation::Base64 => BASE64.encode(raw),
    }
  }

  /// Decode an encoded secret back to raw bytes.
  ///
  /// # Errors
  ///
  /// Returns [`KeystepError::InvalidSecret`] when the input is not valid
  /// under this representation.
  pub fn decode(&self, secret: &str) -> KeystepResult<Vec<u8>> {
    let clean: String = secret.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = match self {
      KeyRepresentation::Base32 => {
        let clean = clean.trim_end_matches('=').to_ascii_uppercase();
        BASE32_NOPAD.decode(clean.as_bytes())?
      },
      KeyRepresentation::Base64 => BASE64.decode(clean.as_bytes())?,
    };

    Ok(raw)
  }
}

/// Immutable authenticator parameters.
///
/// Instances are validated when built and shared freely afterwards; there
/// is no mutation after construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatorConfig {
  code_digits:        u32,
  time_step_ms:       u64,
  window_size:        u32,
  hmac_hash:          HashAlgorithm,
  key_representation: KeyRepresentation,
  key_length:         usize,
  scratch_codes:      usize,
}

impl Default for AuthenticatorConfig {
  fn default() -> Self {
    Self {
      code_digits:        DEFAULT_CODE_DIGITS,
      time_step_ms:       DEFAULT_TIME_STEP_MS,
      window_size:        DEFAULT_WINDOW_SIZE,
      hmac_hash:          HashAlgorithm::Sha1,
      key_representation: KeyRepresentation::Base32,
      key_length:         DEFAULT_KEY_LENGTH,
      scratch_codes:      DEFAULT_SCRATCH_CODES,
    }
  }
}

impl AuthenticatorConfig {
  /// Start building a configuration from the defaults.
  pub fn builder() -> AuthenticatorConfigBuilder {
    AuthenticatorConfigBuilder { config: Self::default() }
  }

  /// Number of decimal digits in a one-time code (6, 7, or 8).
  pub fn code_digits(&self) -> u32 { self.code_digits }

  /// The exclusive upper bound of valid codes, `10^code_digits`.
  pub fn code_modulus(&self) -> u32 { 10_u32.pow(self.code_digits) }

  /// The TOTP interval in milliseconds.
  pub fn time_step_ms(&self) -> u64 { self.time_step_ms }

  /// Number of adjacent intervals scanned during verification.
  pub fn window_size(&self) -> u32 { self.window_size }

  /// The HMAC hash function codes are derived with.
  pub fn hmac_hash(&self) -> HashAlgorithm { self.hmac_hash }

  /// Encoding of stored secrets.
  pub fn key_representation(&self) -> KeyRepresentation { self.key_representation }

  /// Raw secret length in bytes.
  pub fn key_length(&self) -> usize { self.key_length }

  /// Number of scratch codes minted alongside each secret.
  pub fn scratch_codes(&self) -> usize { self.scratch_codes }
}

/// Named-parameter builder for [`AuthenticatorConfig`].
///
/// Validation happens once, in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct AuthenticatorConfigBuilder {
  config: AuthenticatorConfig,
}

impl AuthenticatorConfigBuilder {
  /// Set the number of code digits (6, 7, or 8).
  pub fn code_digits(mut self, digits: u32) -> Self {
    self.config.code_digits = digits;
    self
  }

  /// Set the TOTP interval in milliseconds.
  pub fn time_step_ms(mut self, step_ms: u64) -> Self {
    self.config.time_step_ms = step_ms;
    self
  }

  /// Set the verification window, in intervals.
  pub fn window_size(mut self, window: u32) -> Self {
    self.config.window_size = window;
    self
  }

  /// Set the HMAC hash function.
  pub fn hmac_hash(mut self, hash: HashAlgorithm) -> Self {
    self.config.hmac_hash = hash;
    self
  }

  /// Set the secret encoding.
  pub fn key_representation(mut self, representation: KeyRepresentation) -> Self {
    self.config.key_representation = representation;
    self
  }

  /// Set the raw secret length in bytes (at least 10).
  pub fn key_length(mut self, length: usize) -> Self {
    self.config.key_length = length;
    self
  }

  /// Set the number of scratch codes generated per credential.
  pub fn scratch_codes(mut self, count: usize) -> Self {
    self.config.scratch_codes = count;
    self
  }

  /// Validate and freeze the configuration.
  ///
  /// # Errors
  ///
  /// * [`KeystepError::InvalidDigits`] unless digits are 6, 7, or 8.
  /// * [`KeystepError::InvalidTimeStep`] for a zero step.
  /// * [`KeystepError::InvalidWindow`] unless the window is in `[1, 17]`.
  /// * [`KeystepError::InvalidKeyLength`] for keys shorter than 10 bytes.
  pub fn build(self) -> KeystepResult<AuthenticatorConfig> {
    let config = self.config;

    if !(6..=8).contains(&config.code_digits) {
      return Err(KeystepError::InvalidDigits);
    }
    if config.time_step_ms == 0 {
      return Err(KeystepError::InvalidTimeStep);
    }
    if config.window_size < 1 || config.window_size > MAX_WINDOW {
      return Err(KeystepError::InvalidWindow);
    }
    if config.key_length < MIN_KEY_LENGTH {
      return Err(KeystepError::InvalidKeyLength(MIN_KEY_LENGTH));
    }

    Ok(config)
  }
}
