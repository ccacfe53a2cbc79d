//! Least-significant-bit primitive shared by every carrier.
//!
//! Bit `i` of the stream goes into the low bit of carrier byte `i`. Bytes past
//! the end of the stream are left alone.

use super::error::CarrierError;

/// Writes `bits` (each 0 or 1) into the low bits of the first `bits.len()`
/// carrier bytes.
///
/// The capacity check runs before any byte is touched, so on error the
/// carrier is unchanged.
pub fn embed_bits(carrier: &mut [u8], bits: &[u8]) -> Result<(), CarrierError> {
    if bits.len() > carrier.len() {
        return Err(CarrierError::CapacityExceeded {
            needed: bits.len(),
            available: carrier.len(),
        });
    }

    for (byte, bit) in carrier.iter_mut().zip(bits) {
        *byte = (*byte & 0xFE) | (bit & 1);
    }

    Ok(())
}

/// Lazily yields the low bit of every carrier byte.
pub fn lsb_bits(carrier: &[u8]) -> impl Iterator<Item = u8> + '_ {
    carrier.iter().map(|byte| byte & 1)
}
