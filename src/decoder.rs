//! Message decoding.
//!
//! Decoding walks the carrier's LSBs until the end marker, re-derives the key
//! and opens the token. Failures are reported in three buckets only:
//! no hidden data, wrong password (any cipher failure, on purpose not broken
//! down further), and unreadable carrier.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::crypto::{decrypt_token, derive_key};
use crate::stego::{AudioStego, CarrierError, CarrierKind, FrameError, ImageStego, VideoStego};

/// Errors that can occur during decoding.
#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("No hidden data found")]
    NoHiddenData,

    #[error("Incorrect password or corrupt data")]
    WrongPassword,

    #[error("Could not read carrier: {0}")]
    Carrier(#[from] CarrierError),
}

impl From<FrameError> for DecoderError {
    fn from(_: FrameError) -> Self {
        DecoderError::NoHiddenData
    }
}

/// Caller-facing result of a decode, serialized as
/// `{"status": "success", "secret_message": ...}` or
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DecodeOutcome {
    Success { secret_message: String },
    Error { message: String },
}

impl From<Result<String, DecoderError>> for DecodeOutcome {
    fn from(result: Result<String, DecoderError>) -> Self {
        match result {
            Ok(secret_message) => DecodeOutcome::Success { secret_message },
            // carrier details stay out of the caller-facing message
            Err(DecoderError::Carrier(_)) => DecodeOutcome::Error {
                message: "Could not read carrier file".to_string(),
            },
            Err(e) => DecodeOutcome::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Opens an extracted token with the password.
fn open(token: &[u8], password: &str) -> Result<String, DecoderError> {
    let key = derive_key(password);
    let plaintext = decrypt_token(&key, token).map_err(|_| DecoderError::WrongPassword)?;
    String::from_utf8(plaintext).map_err(|_| DecoderError::WrongPassword)
}

/// Recovers the secret from a stego image.
pub fn decode_image(carrier: &[u8], password: &str) -> Result<String, DecoderError> {
    let token = ImageStego::from_bytes(carrier)?.extract()?;
    debug!(token_len = token.len(), "extracted token from image");
    open(&token, password)
}

/// Recovers the secret from a stego WAV.
pub fn decode_audio(carrier: &[u8], password: &str) -> Result<String, DecoderError> {
    let token = AudioStego::from_bytes(carrier)?.extract()?;
    debug!(token_len = token.len(), "extracted token from audio");
    open(&token, password)
}

/// Recovers the secret from a stego AVI. Only the first frame is decoded.
pub fn decode_video(carrier: &[u8], password: &str) -> Result<String, DecoderError> {
    let token = VideoStego::first_frame(carrier)?.extract()?;
    debug!(token_len = token.len(), "extracted token from video");
    open(&token, password)
}

/// Recovers the secret from a carrier of the given kind.
pub fn decode(kind: CarrierKind, carrier: &[u8], password: &str) -> Result<String, DecoderError> {
    match kind {
        CarrierKind::Image => decode_image(carrier, password),
        CarrierKind::Audio => decode_audio(carrier, password),
        CarrierKind::Video => decode_video(carrier, password),
    }
}
