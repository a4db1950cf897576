//! Error surface of the library.

/// Convenience alias used by every fallible operation in this crate.
pub type KeystepResult<T> = Result<T, KeystepError>;

/// All failures the library can surface.
///
/// Verification itself answers with a boolean; only structural problems
/// (malformed secrets, out-of-range windows, a missing repository) become
/// errors.
#[derive(thiserror::Error, Debug)]
pub enum KeystepError {
  #[error("account name cannot be empty!")]
  EmptyAccountName,

  #[error("issuer cannot contain the ':' character!")]
  ColonInIssuer,

  #[error("account name cannot contain the ':' character!")]
  ColonInAccountName,

  #[error("invalid code digits! digits must be 6, 7, or 8")]
  InvalidDigits,

  #[error("time step must be positive")]
  InvalidTimeStep,

  #[error("key length must be at least {0} bytes")]
  InvalidKeyLength(usize),

  #[error("invalid verification window! window must be between 1 and 17")]
  InvalidWindow,

  #[error("invalid secret")]
  InvalidSecret(#[from] data_encoding::DecodeError),

  #[error("invalid hmac key!")]
  InvalidHmacKey,

  #[error("no credential repository is configured")]
  RepositoryNotConfigured,

  #[error("no credentials found for user {0}")]
  UnknownUser(String),

  #[error("credential repository failure: {0}")]
  Repository(#[source] Box<dyn std::error::Error + Send + Sync>),
}
