//! HOTP code derivation (RFC 4226) on top of keyed HMAC.
//!
//! This is the computational heart of the library: everything else feeds a
//! counter and a key into [`hotp_code`] and compares the result.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::{KeystepError, KeystepResult};

/// The HMAC hash function used to derive one-time codes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HashAlgorithm {
  /// SHA-1
  #[serde(rename = "sha1")]
  Sha1,
  /// SHA-256
  #[serde(rename = "sha256")]
  Sha256,
  /// SHA-512
  #[serde(rename = "sha512")]
  Sha512,
}

impl std::fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", match self {
      HashAlgorithm::Sha1 => "sha1",
      HashAlgorithm::Sha256 => "sha256",
      HashAlgorithm::Sha512 => "sha512",
    })
  }
}

/// Keyed MAC of an 8-byte counter message: 20, 32, or 64 bytes depending on
/// the hash. MAC objects are constructed per call; re-keying a RustCrypto
/// HMAC costs no more than building one.
fn hmac_digest(hash: HashAlgorithm, key: &[u8], message: &[u8; 8]) -> KeystepResult<Vec<u8>> {
  let digest = match hash {
    HashAlgorithm::Sha1 => {
      let mut mac =
        Hmac::<Sha1>::new_from_slice(key).map_err(|_| KeystepError::InvalidHmacKey)?;
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    },
    HashAlgorithm::Sha256 => {
      let mut mac =
        Hmac::<Sha256>::new_from_slice(key).map_err(|_| KeystepError::InvalidHmacKey)?;
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    },
    HashAlgorithm::Sha512 => {
      let mut mac =
        Hmac::<Sha512>::new_from_slice(key).map_err(|_| KeystepError::InvalidHmacKey)?;
      mac.update(message);
      mac.finalize().into_bytes().to_vec()
    },
  };

  Ok(digest)
}

/// Generate the HOTP code for `counter` under `key`.
///
/// The counter is encoded as an 8-byte big-endian message; the MAC is
/// dynamically truncated as per RFC 4226 section 5.3 and reduced modulo
/// `10^digits`.
///
/// # Errors
///
/// Returns [`KeystepError::InvalidHmacKey`] if the MAC cannot be keyed.
/// Key problems are a host misconfiguration, never a failed verification.
pub fn hotp_code(
  key: &[u8],
  counter: u64,
  hash: HashAlgorithm,
  digits: u32,
) -> KeystepResult<u32> {
  let digest = hmac_digest(hash, key, &counter.to_be_bytes())?;

  let offset = (digest[digest.len() - 1] & 0xf) as usize;
  let code = u32::from_be_bytes([
    digest[offset] & 0x7f,
    digest[offset + 1],
    digest[offset + 2],
    digest[offset + 3],
  ]);

  Ok(code % 10_u32.pow(digits))
}
