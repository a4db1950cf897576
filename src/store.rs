//! The credential-repository capability.
//!
//! Persistence belongs to the embedding application. The library only
//! needs two operations: look up a user's encoded secret, and save a
//! freshly minted credential set. An application either hands its
//! repository to the facade at construction, or registers one process-wide
//! here for facades built without an explicit repository to discover.

use std::sync::{Arc, RwLock};

use crate::error::KeystepResult;

/// Read/write access to per-user credentials owned by the embedding
/// application.
pub trait CredentialRepository: Send + Sync {
  /// Retrieve the encoded secret of `user_name`.
  ///
  /// # Errors
  ///
  /// [`KeystepError::UnknownUser`](crate::error::KeystepError::UnknownUser)
  /// when no credentials exist for the user;
  /// [`KeystepError::Repository`](crate::error::KeystepError::Repository)
  /// for backend failures.
  fn secret_key(&self, user_name: &str) -> KeystepResult<String>;

  /// Persist freshly minted credentials for `user_name`.
  ///
  /// # Errors
  ///
  /// [`KeystepError::Repository`](crate::error::KeystepError::Repository)
  /// for backend failures.
  fn save_credentials(
    &self,
    user_name: &str,
    secret_key: &str,
    validation_code: u32,
    scratch_codes: &[u32],
  ) -> KeystepResult<()>;
}

static GLOBAL_REPOSITORY: RwLock<Option<Arc<dyn CredentialRepository>>> = RwLock::new(None);

/// Register a process-wide repository.
///
/// Facades constructed without an explicit repository consult this
/// registrar on their first user-scoped operation and cache the outcome.
/// Register before building facades; a facade that has already looked up
/// an absent repository will not look again.
pub fn register_repository(repository: Arc<dyn CredentialRepository>) {
  *GLOBAL_REPOSITORY.write().expect("repository registry poisoned") = Some(repository);
}

/// The currently registered process-wide repository, if any.
pub(crate) fn registered_repository() -> Option<Arc<dyn CredentialRepository>> {
  let found = GLOBAL_REPOSITORY.read().expect("repository registry poisoned").clone();
  if found.is_none() {
    log::debug!("no process-wide credential repository registered");
  }
  found
}
