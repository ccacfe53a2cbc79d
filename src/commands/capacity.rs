//! Capacity command - report how much a carrier can hold.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use omnihide::{capacity, CarrierKind, StegoConfig};

use super::{resolve_kind, CommandExecutor};

/// Show how many bits a carrier offers and the longest message that fits.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Path to the carrier file
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// Carrier type, if it can't be guessed from the extension
    #[arg(short, long)]
    pub kind: Option<CarrierKind>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, _config: &StegoConfig) -> Result<()> {
        let kind = resolve_kind(&self.carrier, self.kind)?;
        let carrier = std::fs::read(&self.carrier)
            .with_context(|| format!("Failed to read carrier from {}", self.carrier.display()))?;

        let report = capacity(kind, &carrier)
            .with_context(|| format!("Failed to read {} carrier", kind))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            );
            return Ok(());
        }

        println!("Carrier:   {} ({})", self.carrier.display(), report.kind);
        println!("Capacity:  {} bits ({} bytes)", report.capacity_bits, report.capacity_bits / 8);
        match report.max_secret_len {
            Some(n) => println!("Max message: {} bytes", n),
            None => println!("Max message: none (carrier too small for any message)"),
        }

        Ok(())
    }
}
