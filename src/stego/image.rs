//! LSB (Least Significant Bit) steganography for images.
//!
//! The pixel grid is flattened row-major, channel-minor (R, G, B[, A] of the
//! first pixel, then the next pixel, ...). Bit `i` of the framed bitstream
//! lands in the low bit of byte `i`; every channel byte, alpha included,
//! carries one bit.
//!
//! 8-bit Luma, LumaA, RGB and RGBA images keep their layout. Anything else
//! (16-bit, float, ...) is converted to 8-bit RGB or RGBA on load.
//!
//! Output is always PNG. A lossy format would destroy the low bits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

use super::error::CarrierError;
use super::frame::{self, FrameError};
use super::lsb;

/// Image steganography handler.
pub struct ImageStego {
    image: DynamicImage,
}

impl ImageStego {
    /// Creates a new ImageStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CarrierError> {
        let image = image::open(path).map_err(|e| CarrierError::Read(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Creates a new ImageStego from encoded image bytes (PNG, BMP, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CarrierError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| CarrierError::Read(e.to_string()))?;
        Ok(Self::from_image(image))
    }

    /// Creates a new ImageStego from a decoded pixel grid.
    pub fn from_image(image: DynamicImage) -> Self {
        let image = match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => image,
            other => {
                warn!(color = ?other.color(), "reducing image to 8 bits per channel");
                if other.color().has_alpha() {
                    DynamicImage::ImageRgba8(other.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(other.to_rgb8())
                }
            }
        };
        Self { image }
    }

    /// Returns the number of bits this image can carry (one per channel byte).
    pub fn capacity_bits(&self) -> usize {
        self.image.as_bytes().len()
    }

    /// Writes a framed bitstream into the pixel LSBs.
    ///
    /// # Returns
    /// A new image with the bits embedded; `self` is never modified.
    pub fn embed(&self, bits: &[u8]) -> Result<DynamicImage, CarrierError> {
        let capacity = self.capacity_bits();
        if bits.len() > capacity {
            return Err(CarrierError::CapacityExceeded {
                needed: bits.len(),
                available: capacity,
            });
        }

        let mut output = self.image.clone();
        lsb::embed_bits(raw_bytes_mut(&mut output)?, bits)?;

        let (width, height) = output.dimensions();
        debug!(width, height, bits = bits.len(), capacity, "embedded bits in image");

        Ok(output)
    }

    /// Frames `token` and hides it in the image.
    pub fn hide(&self, token: &[u8]) -> Result<DynamicImage, CarrierError> {
        self.embed(&frame::serialize(token))
    }

    /// Extracts the framed token from the image.
    pub fn extract(&self) -> Result<Vec<u8>, FrameError> {
        let bytes = self.image.as_bytes();
        let (token, consumed) = frame::parse(lsb::lsb_bits(bytes), bytes.len())?;
        debug!(consumed, token_len = token.len(), "found end marker in image");
        Ok(token)
    }

    /// Saves the image to a file, always as PNG regardless of extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CarrierError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| CarrierError::Write(e.to_string()))
    }

    /// Returns the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, CarrierError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CarrierError::Write(e.to_string()))?;
        Ok(bytes)
    }

    /// Returns a reference to the underlying image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Mutable view of the flattened channel bytes.
fn raw_bytes_mut(image: &mut DynamicImage) -> Result<&mut [u8], CarrierError> {
    match image {
        DynamicImage::ImageLuma8(buf) => Ok(&mut **buf),
        DynamicImage::ImageLumaA8(buf) => Ok(&mut **buf),
        DynamicImage::ImageRgb8(buf) => Ok(&mut **buf),
        DynamicImage::ImageRgba8(buf) => Ok(&mut **buf),
        other => Err(CarrierError::Unsupported(format!("{:?}", other.color()))),
    }
}
