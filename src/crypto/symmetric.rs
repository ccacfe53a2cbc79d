//! Authenticated encryption of the hidden payload.
//!
//! This module provides:
//! - ChaCha20-Poly1305 encryption with a random nonce per message
//! - A self-contained token carrying version, nonce and auth tag
//! - URL-safe base64 armour, so the token never contains `#`
//!
//! Token layout before armouring:
//! `version (1) || nonce (12) || ciphertext || tag (16)`

use base64::{engine::general_purpose::URL_SAFE, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use super::key::DerivedKey;

/// Token format version.
pub const TOKEN_VERSION: u8 = 0x01;

/// Nonce size for ChaCha20Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Bytes added to the plaintext before armouring: version + nonce + tag.
pub const TOKEN_OVERHEAD: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// Errors that can occur while sealing or opening a token.
///
/// Callers must not tell these apart when reporting to a user; they all mean
/// "incorrect password or corrupt data".
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Empty token")]
    EmptyToken,

    #[error("Token is not valid base64")]
    MalformedToken,

    #[error("Unsupported token version: {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("Token too short")]
    TokenTooShort,

    #[error("Authentication failed")]
    AuthenticationFailed,
}

/// Length of the armoured token for a plaintext of `plaintext_len` bytes.
pub fn token_len(plaintext_len: usize) -> usize {
    (TOKEN_OVERHEAD + plaintext_len).div_ceil(3) * 4
}

/// Largest plaintext whose armoured token fits in `token_len` bytes.
pub fn max_plaintext_len(token_len: usize) -> usize {
    ((token_len / 4) * 3).saturating_sub(TOKEN_OVERHEAD)
}

/// Encrypts `plaintext` and returns the armoured token bytes (ASCII).
pub fn encrypt_token(key: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::EncryptionFailed)?;

    let mut raw = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
    raw.push(TOKEN_VERSION);
    raw.extend_from_slice(&nonce_bytes);
    raw.extend_from_slice(&ciphertext);

    Ok(URL_SAFE.encode(raw).into_bytes())
}

/// Opens an armoured token and returns the plaintext.
pub fn decrypt_token(key: &DerivedKey, token: &[u8]) -> Result<Vec<u8>, CipherError> {
    if token.is_empty() {
        return Err(CipherError::EmptyToken);
    }

    let raw = URL_SAFE
        .decode(token)
        .map_err(|_| CipherError::MalformedToken)?;

    if raw.len() < TOKEN_OVERHEAD {
        return Err(CipherError::TokenTooShort);
    }
    if raw[0] != TOKEN_VERSION {
        return Err(CipherError::UnsupportedVersion(raw[0]));
    }

    let nonce = Nonce::from_slice(&raw[1..1 + NONCE_SIZE]);
    let ciphertext = &raw[1 + NONCE_SIZE..];

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CipherError::AuthenticationFailed)
}
