//! LSB steganography for video.
//!
//! Only the first frame carries the payload; every later frame is copied
//! through untouched, so capacity equals one frame's channel-byte count.
//! The first frame is embedded exactly like an RGB image (row-major,
//! channel-minor).
//!
//! Output is always an uncompressed AVI. Any inter-frame or quantizing codec
//! would wipe the embedded bits.

use image::{DynamicImage, RgbImage};
use std::path::Path;
use tracing::debug;

use super::avi::{self, FrameRate};
use super::error::CarrierError;
use super::frame::{self, FrameError};
use super::image::ImageStego;

/// Video steganography handler.
pub struct VideoStego {
    frame_rate: FrameRate,
    frames: Vec<RgbImage>,
}

impl VideoStego {
    /// Creates a new VideoStego from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CarrierError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Creates a new VideoStego from uncompressed AVI bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CarrierError> {
        let (frame_rate, frames) = avi::read_avi(bytes)?;
        Ok(Self { frame_rate, frames })
    }

    /// Creates a VideoStego from decoded frames.
    ///
    /// All frames must have the same, non-zero dimensions.
    pub fn from_frames(frames: Vec<RgbImage>, fps: f64) -> Result<Self, CarrierError> {
        let frame_rate = FrameRate::from_fps(fps)?;
        let first = frames
            .first()
            .ok_or_else(|| CarrierError::InvalidFrames("no frames".to_string()))?;
        let dims = first.dimensions();
        if dims.0 == 0 || dims.1 == 0 {
            return Err(CarrierError::InvalidFrames("empty frame".to_string()));
        }
        if frames.iter().any(|f| f.dimensions() != dims) {
            return Err(CarrierError::InvalidFrames(
                "frames have different dimensions".to_string(),
            ));
        }
        Ok(Self { frame_rate, frames })
    }

    /// Decodes only the first frame of an AVI, as an image carrier.
    pub fn first_frame(bytes: &[u8]) -> Result<ImageStego, CarrierError> {
        let frame = avi::read_first_frame(bytes)?;
        Ok(ImageStego::from_image(DynamicImage::ImageRgb8(frame)))
    }

    /// Returns the number of bits this video can carry (first frame only).
    pub fn capacity_bits(&self) -> usize {
        self.frames.first().map_or(0, |f| f.as_raw().len())
    }

    /// Writes a framed bitstream into the first frame.
    ///
    /// # Returns
    /// A new VideoStego whose first frame carries the bits.
    pub fn embed(&self, bits: &[u8]) -> Result<Self, CarrierError> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| CarrierError::InvalidFrames("no frames".to_string()))?;

        let carrier = ImageStego::from_image(DynamicImage::ImageRgb8(first.clone()));
        let embedded = carrier.embed(bits)?.into_rgb8();

        let mut frames = Vec::with_capacity(self.frames.len());
        frames.push(embedded);
        frames.extend(self.frames[1..].iter().cloned());

        debug!(
            frames = frames.len(),
            fps = self.frame_rate.fps(),
            "embedded bits in first video frame"
        );

        Ok(Self {
            frame_rate: self.frame_rate,
            frames,
        })
    }

    /// Frames `token` and hides it in the first frame.
    pub fn hide(&self, token: &[u8]) -> Result<Self, CarrierError> {
        self.embed(&frame::serialize(token))
    }

    /// Extracts the framed token from the first frame.
    pub fn extract(&self) -> Result<Vec<u8>, FrameError> {
        match self.frames.first() {
            Some(first) => ImageStego::from_image(DynamicImage::ImageRgb8(first.clone())).extract(),
            None => Err(FrameError::NoMarkerFound { scanned: 0 }),
        }
    }

    /// Saves the video as an uncompressed AVI file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CarrierError> {
        std::fs::write(path, self.to_avi_bytes()?)?;
        Ok(())
    }

    /// Returns the video as uncompressed AVI bytes.
    pub fn to_avi_bytes(&self) -> Result<Vec<u8>, CarrierError> {
        avi::write_avi(&self.frames, self.frame_rate)
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.frame_rate.fps()
    }

    /// Returns the decoded frames.
    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }
}
