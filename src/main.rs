//! OmniHide - hide text in images, audio and video
//!
//! A CLI tool for password-protected LSB steganography.
//! Carriers are written back losslessly as PNG, WAV or uncompressed AVI.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{CapacityCommand, CommandExecutor, DecodeCommand, EncodeCommand};
use omnihide::{ConfigError, StegoConfig};

/// OmniHide - hide text in images, audio and video
///
/// The message is encrypted with a password-derived key and written into the
/// least significant bit of every carrier byte.
#[derive(Parser)]
#[command(name = "omnihide")]
#[command(version)]
#[command(about = "Password-protected LSB steganography for images, audio and video")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.omnihide/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a message in a carrier
    Encode(EncodeCommand),

    /// Recover a hidden message
    Decode(DecodeCommand),

    /// Show how much a carrier can hold
    Capacity(CapacityCommand),
}

fn load_config(path: Option<&PathBuf>) -> Result<StegoConfig> {
    match path {
        Some(path) => StegoConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        // no home directory just means no master secret
        None => match StegoConfig::load() {
            Err(ConfigError::NoConfigDir) => Ok(StegoConfig::default()),
            other => other.context("Failed to load config"),
        },
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("omnihide={}", log_level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;

    match &cli.command {
        Commands::Encode(cmd) => cmd.execute(&config),
        Commands::Decode(cmd) => cmd.execute(&config),
        Commands::Capacity(cmd) => cmd.execute(&config),
    }
}
