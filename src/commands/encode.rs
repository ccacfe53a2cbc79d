//! Encode command - hide a message in an image, WAV or AVI.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use omnihide::{encode, CarrierKind, StegoConfig};

use super::{default_output_path, resolve_kind, CommandExecutor};

/// Hide a password-protected message in a carrier.
///
/// The carrier is read, the message is encrypted and written into the low
/// bit of each carrier byte, and a lossless copy is saved:
/// - images are saved as PNG
/// - audio is saved as WAV with the original sample format
/// - video is saved as an uncompressed AVI (message in the first frame)
///
/// The input carrier is never modified.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Path to the carrier file (image, .wav or .avi)
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// Carrier type, if it can't be guessed from the extension
    #[arg(short, long)]
    pub kind: Option<CarrierKind>,

    /// Text message to hide (read from stdin if omitted)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Password (falls back to the configured master secret)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Output path (default: stego_<name>.<png|wav|avi> next to the carrier)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &StegoConfig) -> Result<()> {
        let kind = resolve_kind(&self.carrier, self.kind)?;
        let password = config
            .resolve_password(self.password.as_deref())
            .context("Use --password or set master_secret in the config file")?;

        let carrier = std::fs::read(&self.carrier)
            .with_context(|| format!("Failed to read carrier from {}", self.carrier.display()))?;
        debug!(%kind, bytes = carrier.len(), "loaded carrier");

        let message = match &self.message {
            Some(m) => m.clone(),
            None => {
                eprintln!("Reading message from stdin (Ctrl+D to finish):");
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read message from stdin")?;
                buffer.trim_end_matches(['\r', '\n']).to_string()
            }
        };

        let encoded = encode(kind, &carrier, password, &message)
            .with_context(|| format!("Failed to hide message in {}", self.carrier.display()))?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.carrier, kind));
        std::fs::write(&output, &encoded.data)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        info!(
            bits_used = encoded.bits_used,
            capacity_bits = encoded.capacity_bits,
            "message hidden"
        );
        println!("{}", output.display());

        Ok(())
    }
}
