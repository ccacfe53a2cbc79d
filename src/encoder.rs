//! Message encoding.
//!
//! This module orchestrates the encoding process:
//! 1. Read the carrier
//! 2. Derive the key from the password
//! 3. Encrypt the secret into a marker-safe token
//! 4. Frame the token into a bitstream
//! 5. Check capacity (nothing is modified on failure)
//! 6. Embed into the carrier LSBs
//! 7. Write the lossless output container

use hound::WavSpec;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::crypto::{derive_key, encrypt_token, max_plaintext_len, token_len, CipherError};
use crate::stego::frame::{self, END_MARKER};
use crate::stego::{AudioStego, CarrierError, CarrierKind, ImageStego, VideoStego};

/// Errors that can occur during encoding.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("{0}")]
    Carrier(#[from] CarrierError),

    #[error("Encryption error: {0}")]
    Cipher(#[from] CipherError),
}

impl EncoderError {
    /// True when the carrier was too small for the framed payload.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            EncoderError::Carrier(CarrierError::CapacityExceeded { .. })
        )
    }
}

/// Result of hiding a secret in a carrier.
#[derive(Debug, Clone)]
pub struct EncodedCarrier {
    /// The lossless output container (PNG, WAV or AVI bytes).
    pub data: Vec<u8>,
    /// Carrier family the data belongs to.
    pub kind: CarrierKind,
    /// Carrier bits overwritten by the framed payload.
    pub bits_used: usize,
    /// Total carrier capacity in bits.
    pub capacity_bits: usize,
}

/// How much a carrier can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarrierCapacity {
    pub kind: CarrierKind,
    /// One bit per carrier byte.
    pub capacity_bits: usize,
    /// Longest secret (in UTF-8 bytes) that still fits, if any does.
    pub max_secret_len: Option<usize>,
}

impl CarrierCapacity {
    fn new(kind: CarrierKind, capacity_bits: usize) -> Self {
        let token_bytes = (capacity_bits / 8).checked_sub(END_MARKER.len());
        let max_secret_len = token_bytes
            .filter(|&t| t >= token_len(0))
            .map(max_plaintext_len);
        Self {
            kind,
            capacity_bits,
            max_secret_len,
        }
    }
}

/// Encrypts and frames `secret`, returning the bitstream to embed.
fn seal(password: &str, secret: &str) -> Result<Vec<u8>, EncoderError> {
    let key = derive_key(password);
    let token = encrypt_token(&key, secret.as_bytes())?;
    let bits = frame::serialize(&token);
    debug!(
        secret_len = secret.len(),
        token_len = token.len(),
        bits = bits.len(),
        "sealed payload"
    );
    Ok(bits)
}

/// Hides `secret` in an encoded image (PNG, BMP, ...) and returns PNG bytes.
pub fn encode_image(
    carrier: &[u8],
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    encode_image_pixels(ImageStego::from_bytes(carrier)?.into_image(), password, secret)
}

/// Hides `secret` in a decoded pixel grid and returns PNG bytes.
pub fn encode_image_pixels(
    pixels: DynamicImage,
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    let stego = ImageStego::from_image(pixels);
    let bits = seal(password, secret)?;

    let hidden = ImageStego::from_image(stego.embed(&bits)?);
    Ok(EncodedCarrier {
        data: hidden.to_png_bytes()?,
        kind: CarrierKind::Image,
        bits_used: bits.len(),
        capacity_bits: stego.capacity_bits(),
    })
}

/// Hides `secret` in a WAV file and returns WAV bytes with the same spec.
pub fn encode_audio(
    carrier: &[u8],
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    encode_audio_stego(AudioStego::from_bytes(carrier)?, password, secret)
}

/// Hides `secret` in raw PCM frames and returns a WAV container built from
/// `spec`.
pub fn encode_audio_frames(
    spec: WavSpec,
    frames: Vec<u8>,
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    encode_audio_stego(AudioStego::from_pcm(spec, frames)?, password, secret)
}

fn encode_audio_stego(
    stego: AudioStego,
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    let bits = seal(password, secret)?;
    let hidden = stego.embed(&bits)?;
    Ok(EncodedCarrier {
        data: hidden.to_wav_bytes()?,
        kind: CarrierKind::Audio,
        bits_used: bits.len(),
        capacity_bits: stego.capacity_bits(),
    })
}

/// Hides `secret` in the first frame of an uncompressed AVI.
pub fn encode_video(
    carrier: &[u8],
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    encode_video_stego(VideoStego::from_bytes(carrier)?, password, secret)
}

/// Hides `secret` in the first of `frames` and writes an uncompressed AVI at
/// `fps`.
pub fn encode_video_frames(
    frames: Vec<RgbImage>,
    fps: f64,
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    encode_video_stego(VideoStego::from_frames(frames, fps)?, password, secret)
}

fn encode_video_stego(
    stego: VideoStego,
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    let bits = seal(password, secret)?;
    let hidden = stego.embed(&bits)?;
    Ok(EncodedCarrier {
        data: hidden.to_avi_bytes()?,
        kind: CarrierKind::Video,
        bits_used: bits.len(),
        capacity_bits: stego.capacity_bits(),
    })
}

/// Hides `secret` in a carrier of the given kind.
pub fn encode(
    kind: CarrierKind,
    carrier: &[u8],
    password: &str,
    secret: &str,
) -> Result<EncodedCarrier, EncoderError> {
    match kind {
        CarrierKind::Image => encode_image(carrier, password, secret),
        CarrierKind::Audio => encode_audio(carrier, password, secret),
        CarrierKind::Video => encode_video(carrier, password, secret),
    }
}

/// Reports how much a carrier can hold.
pub fn capacity(kind: CarrierKind, carrier: &[u8]) -> Result<CarrierCapacity, CarrierError> {
    let capacity_bits = match kind {
        CarrierKind::Image => ImageStego::from_bytes(carrier)?.capacity_bits(),
        CarrierKind::Audio => AudioStego::from_bytes(carrier)?.capacity_bits(),
        CarrierKind::Video => VideoStego::first_frame(carrier)?.capacity_bits(),
    };
    Ok(CarrierCapacity::new(kind, capacity_bits))
}
