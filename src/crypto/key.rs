//! Password-based key derivation.
//!
//! The key is a plain SHA-256 digest of the password bytes. There is no salt:
//! nothing is stored next to the carrier, so the decoder has to be able to
//! rebuild the exact same key from the password alone.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived key in bytes (ChaCha20-Poly1305 key size).
pub const KEY_SIZE: usize = 32;

/// A symmetric key derived from a password.
///
/// Lives for a single encode/decode call and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derives a 256-bit key from a password.
///
/// Deterministic and total: the same password always yields the same key, and
/// the empty password is accepted.
pub fn derive_key(password: &str) -> DerivedKey {
    let digest = Sha256::digest(password.as_bytes());
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest);
    DerivedKey(key)
}
