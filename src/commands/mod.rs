//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod capacity;
mod decode;
mod encode;

pub use capacity::CapacityCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;

use std::path::{Path, PathBuf};

use anyhow::Result;
use omnihide::{CarrierKind, StegoConfig};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, config: &StegoConfig) -> Result<()>;
}

/// Uses the explicit kind, or guesses it from the file extension.
fn resolve_kind(carrier: &Path, kind: Option<CarrierKind>) -> Result<CarrierKind> {
    match kind.or_else(|| CarrierKind::from_path(carrier)) {
        Some(kind) => Ok(kind),
        None => anyhow::bail!(
            "Cannot tell the carrier type of {} from its extension; pass --kind image|audio|video",
            carrier.display()
        ),
    }
}

/// `stego_<stem>.<ext>` next to the carrier.
fn default_output_path(carrier: &Path, kind: CarrierKind) -> PathBuf {
    let stem = carrier
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("carrier");
    let name = format!("stego_{}.{}", stem, kind.output_extension());
    match carrier.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("media/cat.jpg"), CarrierKind::Image),
            PathBuf::from("media/stego_cat.png")
        );
        assert_eq!(
            default_output_path(Path::new("clip.avi"), CarrierKind::Video),
            PathBuf::from("stego_clip.avi")
        );
    }

    #[test]
    fn test_resolve_kind() {
        assert_eq!(
            resolve_kind(Path::new("a.wav"), None).unwrap(),
            CarrierKind::Audio
        );
        assert_eq!(
            resolve_kind(Path::new("a.bin"), Some(CarrierKind::Image)).unwrap(),
            CarrierKind::Image
        );
        assert!(resolve_kind(Path::new("a.bin"), None).is_err());
    }
}
