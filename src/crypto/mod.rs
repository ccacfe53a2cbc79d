//! Cryptographic layer for OmniHide.
//!
//! This module provides:
//! - Deterministic key derivation from a password (SHA-256)
//! - Authenticated encryption of the hidden text (ChaCha20-Poly1305)
//!   wrapped in a marker-safe base64url token

pub mod key;
pub mod symmetric;

pub use key::{derive_key, DerivedKey, KEY_SIZE};
pub use symmetric::{
    decrypt_token, encrypt_token, max_plaintext_len, token_len, CipherError, TOKEN_OVERHEAD,
};
