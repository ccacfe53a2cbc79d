//! Steganography module for hiding data in media carriers.
//!
//! Supports:
//! - Image LSB steganography (any readable image in, PNG out)
//! - Audio LSB steganography (integer PCM WAV)
//! - Video LSB steganography (first frame of an uncompressed AVI)

pub mod audio;
pub mod avi;
pub mod error;
pub mod frame;
pub mod image;
pub mod lsb;
pub mod video;

pub use audio::AudioStego;
pub use error::CarrierError;
pub use frame::{FrameError, END_MARKER};
pub use self::image::ImageStego;
pub use video::VideoStego;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

/// The three supported carrier families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CarrierKind {
    Image,
    Audio,
    Video,
}

impl CarrierKind {
    /// Guesses the carrier kind from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "png" | "bmp" | "tif" | "tiff" | "gif" | "webp" | "jpg" | "jpeg" => Some(Self::Image),
            "wav" | "wave" => Some(Self::Audio),
            "avi" => Some(Self::Video),
            _ => None,
        }
    }

    /// Extension of the lossless container written for this kind.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Audio => "wav",
            Self::Video => "avi",
        }
    }
}

impl fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        };
        f.write_str(name)
    }
}

impl FromStr for CarrierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown carrier kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(CarrierKind::from_path(Path::new("a/cat.PNG")), Some(CarrierKind::Image));
        assert_eq!(CarrierKind::from_path(Path::new("song.wav")), Some(CarrierKind::Audio));
        assert_eq!(CarrierKind::from_path(Path::new("clip.avi")), Some(CarrierKind::Video));
        assert_eq!(CarrierKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(CarrierKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_kind_parse_and_display() {
        for kind in [CarrierKind::Image, CarrierKind::Audio, CarrierKind::Video] {
            assert_eq!(kind.to_string().parse::<CarrierKind>().unwrap(), kind);
        }
        assert!("midi".parse::<CarrierKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&CarrierKind::Video).unwrap(), r#""video""#);
    }

    #[test]
    fn test_jpeg_input_still_writes_png() {
        let kind = CarrierKind::from_path(Path::new("photo.jpg")).unwrap();
        assert_eq!(kind.output_extension(), "png");
    }
}
