//! Reseeding CSPRNG used for secret and scratch-code generation.
//!
//! The generator is process-scoped: one instance lives inside each facade
//! and hands out uniform random bytes to the credential generator. After a
//! fixed number of draws the underlying algorithm instance is thrown away
//! and rebuilt from fresh OS entropy.

use std::sync::{
  Mutex,
  atomic::{AtomicU64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Number of byte-producing draws after which the generator is rebuilt.
const MAX_OPERATIONS: u64 = 1_000_000;

/// Thread-safe source of cryptographically strong random bytes.
///
/// Draws increment an atomic operation counter; once the counter passes the
/// limit the ChaCha20 core is replaced with one seeded from fresh OS
/// entropy and the counter resets. The mutex makes the rebuild mutually
/// exclusive with every draw.
pub(crate) struct ReseedingRng {
  operations:     AtomicU64,
  max_operations: u64,
  inner:          Mutex<ChaCha20Rng>,
}

impl ReseedingRng {
  pub(crate) fn new() -> Self { Self::with_max_operations(MAX_OPERATIONS) }

  pub(crate) fn with_max_operations(max_operations: u64) -> Self {
    Self {
      operations: AtomicU64::new(0),
      max_operations,
      inner: Mutex::new(ChaCha20Rng::from_entropy()),
    }
  }

  /// Fill `dest` with random bytes, rebuilding the core first when this
  /// draw exceeds the operation limit.
  pub(crate) fn fill_bytes(&self, dest: &mut [u8]) {
    let count = self.operations.fetch_add(1, Ordering::Relaxed) + 1;
    let mut rng = self.inner.lock().expect("rng mutex poisoned");
    // Re-check under the lock so queued threads do not each rebuild.
    if count > self.max_operations && self.operations.load(Ordering::Relaxed) > self.max_operations
    {
      log::debug!("rebuilding CSPRNG after {count} draws");
      *rng = ChaCha20Rng::from_entropy();
      self.operations.store(0, Ordering::Relaxed);
    }
    rng.fill_bytes(dest);
  }

  #[cfg(test)]
  pub(crate) fn operations(&self) -> u64 { self.operations.load(Ordering::Relaxed) }
}
