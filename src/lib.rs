//! # OmniHide - hide text in images, audio and video
//!
//! OmniHide hides a password-protected text message in the least significant
//! bits of a media file and gets it back out again.
//!
//! ## Overview
//!
//! - The password is hashed (SHA-256) into a ChaCha20-Poly1305 key
//! - The message is encrypted into a base64url **token** (nonce and tag inside)
//! - The token is followed by the `#####` end marker and expanded to bits
//! - Bit `i` replaces the low bit of carrier byte `i`
//! - Output is always lossless: PNG, PCM WAV, or uncompressed AVI
//!
//! ## Security Model
//!
//! - **Wrong password fails closed**: the auth tag rejects it, no garbage text
//! - **One error for all cipher failures**: wrong key, tampering and malformed
//!   tokens look identical to the caller
//! - **Nothing is stored** besides the carrier; the key is re-derived on decode
//! - Hiding the *fact* that a message exists is not a goal
//!
//! ## Example Usage
//!
//! ```rust
//! use image::{DynamicImage, RgbImage};
//! use omnihide::{decode_image, encode_image_pixels};
//!
//! let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255])));
//!
//! let encoded = encode_image_pixels(white, "pw123", "hello").unwrap();
//!
//! // encoded.data is a PNG file
//! assert_eq!(decode_image(&encoded.data, "pw123").unwrap(), "hello");
//! assert!(decode_image(&encoded.data, "wrong").is_err());
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: Key derivation and token encryption
//! - [`stego`]: Bit framing and the image/audio/video carriers
//! - [`encoder`]: Encode pipeline
//! - [`decoder`]: Decode pipeline and caller-facing outcome
//! - [`config`]: Optional master secret for no-password mode

pub mod config;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod stego;

// Re-export commonly used types at the crate root
pub use config::{ConfigError, StegoConfig};
pub use decoder::{
    decode, decode_audio, decode_image, decode_video, DecodeOutcome, DecoderError,
};
pub use encoder::{
    capacity, encode, encode_audio, encode_audio_frames, encode_image, encode_image_pixels,
    encode_video, encode_video_frames, CarrierCapacity, EncodedCarrier, EncoderError,
};
pub use stego::{CarrierError, CarrierKind, END_MARKER};
