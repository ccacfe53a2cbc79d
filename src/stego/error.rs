//! Errors shared by the carrier codecs.

use thiserror::Error;

/// Errors that can occur while loading, embedding into, or writing a carrier.
#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("Carrier too small to hide data: need {needed} bits, have {available}")]
    CapacityExceeded { needed: usize, available: usize },

    #[error("Carrier read error: {0}")]
    Read(String),

    #[error("Carrier write error: {0}")]
    Write(String),

    #[error("Unsupported carrier format: {0}")]
    Unsupported(String),

    #[error("Invalid frames: {0}")]
    InvalidFrames(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
