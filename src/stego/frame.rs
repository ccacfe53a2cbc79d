//! Bitstream framing.
//!
//! A frame is the token bytes followed by [`END_MARKER`], each byte expanded
//! to 8 bits, most significant bit first:
//!
//! ```text
//! [token bytes ...][ '#' '#' '#' '#' '#' ]
//! ```
//!
//! The parser reads the carrier's bit stream a byte at a time and stops as
//! soon as the bytes decoded so far end with the marker, so it never has to
//! walk the whole carrier when a payload is present. Tokens are base64url
//! text, which has no `#` in its alphabet, so the first marker match is the
//! real boundary.

use thiserror::Error;

/// End-of-payload sentinel. Part of the wire format between encode and decode.
pub const END_MARKER: &[u8; 5] = b"#####";

/// Number of bits the marker adds to every frame.
pub const MARKER_BITS: usize = END_MARKER.len() * 8;

/// Errors that can occur while parsing a frame.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("No end marker found in {scanned} bits")]
    NoMarkerFound { scanned: usize },
}

/// Number of bits needed to frame a token of `token_len` bytes.
pub fn framed_bit_len(token_len: usize) -> usize {
    (token_len + END_MARKER.len()) * 8
}

/// Expands a token into its framed bitstream (values 0 or 1).
pub fn serialize(token: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(framed_bit_len(token.len()));
    for &byte in token.iter().chain(END_MARKER.iter()) {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Assembles bytes from a bit stream, MSB first.
///
/// Finite and lazy: a trailing group of fewer than 8 bits is dropped.
pub struct BitReader<I> {
    bits: I,
    consumed: usize,
}

impl<I: Iterator<Item = u8>> BitReader<I> {
    /// Wraps a bit iterator.
    pub fn new(bits: I) -> Self {
        Self { bits, consumed: 0 }
    }

    /// Number of bits consumed so far.
    pub fn bits_consumed(&self) -> usize {
        self.consumed
    }
}

impl<I: Iterator<Item = u8>> Iterator for BitReader<I> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        for _ in 0..8 {
            let bit = self.bits.next()?;
            self.consumed += 1;
            byte = (byte << 1) | (bit & 1);
        }
        Some(byte)
    }
}

/// Parses a framed bitstream, reading at most `max_bits` bits.
///
/// Returns the token (everything before the marker) and the number of bits
/// consumed including the marker.
pub fn parse<I>(bits: I, max_bits: usize) -> Result<(Vec<u8>, usize), FrameError>
where
    I: IntoIterator<Item = u8>,
{
    let mut reader = BitReader::new(bits.into_iter().take(max_bits));
    let mut decoded = Vec::new();

    while let Some(byte) = reader.next() {
        decoded.push(byte);
        if decoded.ends_with(END_MARKER) {
            decoded.truncate(decoded.len() - END_MARKER.len());
            return Ok((decoded, reader.bits_consumed()));
        }
    }

    Err(FrameError::NoMarkerFound {
        scanned: reader.bits_consumed(),
    })
}
