//! Decode command - recover a hidden message from a carrier.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use omnihide::{decode, CarrierKind, DecodeOutcome, DecoderError, StegoConfig};

use super::{resolve_kind, CommandExecutor};

/// Recover a hidden message from a stego carrier.
///
/// Prints the message on success. With --json, always prints a
/// `{"status": ...}` object and exits successfully, so callers can branch
/// on the status field instead of the exit code.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Path to the stego carrier (.png, .wav or .avi)
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// Carrier type, if it can't be guessed from the extension
    #[arg(short, long)]
    pub kind: Option<CarrierKind>,

    /// Password (falls back to the configured master secret)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, config: &StegoConfig) -> Result<()> {
        let kind = resolve_kind(&self.carrier, self.kind)?;
        let password = config
            .resolve_password(self.password.as_deref())
            .context("Use --password or set master_secret in the config file")?;

        let result = std::fs::read(&self.carrier)
            .map_err(|e| DecoderError::Carrier(e.into()))
            .and_then(|carrier| decode(kind, &carrier, password));

        if self.json {
            let outcome = DecodeOutcome::from(result);
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).context("Failed to serialize result")?
            );
            return Ok(());
        }

        let message = result
            .with_context(|| format!("Failed to decode {}", self.carrier.display()))?;
        println!("{}", message);

        Ok(())
    }
}
