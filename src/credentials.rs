//! Freshly minted credentials: an encoded secret, the validation code at
//! the UNIX epoch, and a set of single-use scratch codes.

use serde::{Deserialize, Serialize};

use crate::{
  config::AuthenticatorConfig,
  error::KeystepResult,
  hotp::hotp_code,
  rng::ReseedingRng,
};

const BYTES_PER_SCRATCH_CODE: usize = 4;
/// Scratch codes are reduced modulo `10^8`.
const SCRATCH_CODE_MODULUS: u32 = 100_000_000;

/// A newly generated credential set.
///
/// Produced once by [`generate`] and never mutated; ownership passes to the
/// embedding application, which persists it through its credential
/// repository.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
  key:               String,
  verification_code: u32,
  scratch_codes:     Vec<u32>,
  config:            AuthenticatorConfig,
}

impl Credentials {
  #[cfg(test)]
  pub(crate) fn with_key(key: &str, config: AuthenticatorConfig) -> Self {
    Self { key: key.to_string(), verification_code: 0, scratch_codes: Vec::new(), config }
  }

  /// The encoded secret key.
  pub fn key(&self) -> &str { &self.key }

  /// The TOTP code at UNIX time 0, kept for diagnostics and client-side
  /// sanity checks.
  pub fn verification_code(&self) -> u32 { self.verification_code }

  /// The single-use scratch codes, each exactly eight decimal digits.
  pub fn scratch_codes(&self) -> &[u32] { &self.scratch_codes }

  /// The configuration this credential was minted under.
  pub fn config(&self) -> &AuthenticatorConfig { &self.config }
}

/// Mint a credential set from one bulk entropy draw.
///
/// The buffer holds `key_length + scratch_codes * 4` bytes: the secret
/// comes first, then one 4-byte chunk per scratch code. Chunks that fail
/// the scratch-code acceptance rule are replaced by fresh draws.
pub(crate) fn generate(
  config: &AuthenticatorConfig,
  rng: &ReseedingRng,
) -> KeystepResult<Credentials> {
  let key_length = config.key_length();
  let mut buffer = vec![0u8; key_length + config.scratch_codes() * BYTES_PER_SCRATCH_CODE];
  rng.fill_bytes(&mut buffer);

  let raw_secret = &buffer[..key_length];
  let key = config.key_representation().encode(raw_secret);
  let verification_code = hotp_code(raw_secret, 0, config.hmac_hash(), config.code_digits())?;

  let scratch_codes = buffer[key_length..]
    .chunks_exact(BYTES_PER_SCRATCH_CODE)
    .map(|chunk| scratch_code_from(chunk).unwrap_or_else(|| fresh_scratch_code(rng)))
    .collect();

  Ok(Credentials { key, verification_code, scratch_codes, config: config.clone() })
}

/// Reduce a 4-byte chunk to a scratch-code candidate.
///
/// The candidate is accepted only when it has exactly eight decimal digits,
/// i.e. no leading zero.
fn scratch_code_from(chunk: &[u8]) -> Option<u32> {
  let code = (u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) & 0x7fff_ffff)
    % SCRATCH_CODE_MODULUS;

  (code >= SCRATCH_CODE_MODULUS / 10).then_some(code)
}

/// Draw fresh 4-byte chunks until one passes the acceptance rule.
fn fresh_scratch_code(rng: &ReseedingRng) -> u32 {
  loop {
    let mut chunk = [0u8; BYTES_PER_SCRATCH_CODE];
    rng.fill_bytes(&mut chunk);
    if let Some(code) = scratch_code_from(&chunk) {
      return code;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scratch_codes_have_exactly_eight_digits() {
    let config = AuthenticatorConfig::builder().scratch_codes(50).build().unwrap();
    let rng = ReseedingRng::new();

    let credentials = generate(&config, &rng).unwrap();
    assert_eq!(credentials.scratch_codes().len(), 50);
    for code in credentials.scratch_codes() {
      assert!(
        (10_000_000..100_000_000).contains(code),
        "scratch code {code} is not eight digits"
      );
    }
  }

  #[test]
  fn acceptance_rule() {
    // 0x7fffffff % 1e8 = 47483647: two-digit prefix, accepted.
    assert_eq!(scratch_code_from(&[0x7f, 0xff, 0xff, 0xff]), Some(47_483_647));
    // The sign bit is masked off before reduction.
    assert_eq!(scratch_code_from(&[0xff, 0xff, 0xff, 0xff]), Some(47_483_647));
    // Small values have leading zeros and are rejected.
    assert_eq!(scratch_code_from(&[0x00, 0x00, 0x00, 0x01]), None);
    assert_eq!(scratch_code_from(&[0x00, 0x98, 0x96, 0x7f]), None); // 9_999_999
    assert_eq!(scratch_code_from(&[0x00, 0x98, 0x96, 0x80]), Some(10_000_000));
  }

  #[test]
  fn secret_length_follows_config() {
    let config = AuthenticatorConfig::builder().key_length(20).build().unwrap();
    let rng = ReseedingRng::new();

    let credentials = generate(&config, &rng).unwrap();
    let raw = config.key_representation().decode(credentials.key()).unwrap();
    assert_eq!(raw.len(), 20);
  }

  #[test]
  fn verification_code_matches_epoch_totp() {
    let config = AuthenticatorConfig::default();
    let rng = ReseedingRng::new();

    let credentials = generate(&config, &rng).unwrap();
    let raw = config.key_representation().decode(credentials.key()).unwrap();
    let expected = hotp_code(&raw, 0, config.hmac_hash(), config.code_digits()).unwrap();
    assert_eq!(credentials.verification_code(), expected);
    assert!(credentials.verification_code() < config.code_modulus());
  }

  #[test]
  fn entropy_budget_without_scratch_codes() {
    // With no scratch codes the rejection path cannot fire, so generating
    // K credentials is exactly K bulk draws.
    let config = AuthenticatorConfig::builder().scratch_codes(0).build().unwrap();
    let rng = ReseedingRng::new();

    for expected in 1..=4 {
      let credentials = generate(&config, &rng).unwrap();
      assert!(credentials.scratch_codes().is_empty());
      assert_eq!(rng.operations(), expected);
    }
  }

  #[test]
  fn entropy_budget_with_scratch_codes() {
    // One bulk draw per credential, plus a redraw per rejected chunk. The
    // rejection probability is about 0.16 per chunk, so the draw count is
    // bounded but not fixed; assert the lower bound only.
    let config = AuthenticatorConfig::default();
    let rng = ReseedingRng::new();

    for i in 1..=4 {
      generate(&config, &rng).unwrap();
      assert!(rng.operations() >= i);
    }
  }

  #[test]
  fn credentials_serialize() {
    let config = AuthenticatorConfig::default();
    let rng = ReseedingRng::new();

    let credentials = generate(&config, &rng).unwrap();
    let json = serde_json::to_string(&credentials).unwrap();
    let back: Credentials = serde_json::from_str(&json).unwrap();
    assert_eq!(back.key(), credentials.key());
    assert_eq!(back.verification_code(), credentials.verification_code());
    assert_eq!(back.scratch_codes(), credentials.scratch_codes());
  }
}
