//! Pixel values and packed field access
//!
//! Fields are unsigned big-endian bit strings. Bit 0 of the buffer is the
//! most significant bit of byte 0, matching Redis `BITFIELD` addressing, so
//! a 4-bit canvas stores slot 0 in the high nibble of byte 0.

use place_config::max_value;

use crate::constants::BITS_PER_BYTE;
use crate::error::CanvasError;

/// An unsigned `bits`-wide field at the `slot`-th field position.
///
/// Store adapters translate this into their own addressing; Redis renders it
/// as type `u<bits>` at offset `#<slot>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub bits: u8,
    pub slot: u64,
}

impl FieldDescriptor {
    #[inline]
    pub fn new(bits: u8, slot: u64) -> Self {
        Self { bits, slot }
    }

    /// Bit position of the field's most significant bit
    #[inline]
    pub fn bit_offset(&self) -> u64 {
        self.slot * u64::from(self.bits)
    }

    /// Inclusive byte range `(first, last)` the field touches
    #[inline]
    pub fn byte_span(&self) -> (u64, u64) {
        let start = self.bit_offset();
        let end = start + u64::from(self.bits) - 1;
        (start / BITS_PER_BYTE, end / BITS_PER_BYTE)
    }
}

/// Check that `value` fits in an unsigned `bits`-wide field
pub fn validate_value(value: i64, bits: u8) -> Result<u16, CanvasError> {
    let max = max_value(bits);
    u16::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or(CanvasError::InvalidValue { value, bits, max })
}

/// Read `bits` bits starting at `bit_offset`. Bits past the end of `bytes`
/// read as zero, like an unset region of a Redis string.
pub fn read_bits(bytes: &[u8], bit_offset: u64, bits: u8) -> u16 {
    let mut value = 0u16;
    for i in 0..u64::from(bits) {
        let pos = bit_offset + i;
        let byte = usize::try_from(pos / BITS_PER_BYTE)
            .ok()
            .and_then(|index| bytes.get(index))
            .copied()
            .unwrap_or(0);
        let bit = (byte >> (7 - (pos % BITS_PER_BYTE))) & 1;
        value = (value << 1) | u16::from(bit);
    }
    value
}

/// Write the low `bits` bits of `value` starting at `bit_offset`, growing
/// `bytes` with zeros when the field lies past its end.
pub fn write_bits(bytes: &mut Vec<u8>, bit_offset: u64, bits: u8, value: u16) {
    let needed = (bit_offset + u64::from(bits)).div_ceil(BITS_PER_BYTE) as usize;
    if bytes.len() < needed {
        bytes.resize(needed, 0);
    }

    for i in 0..u64::from(bits) {
        let pos = bit_offset + i;
        let mask = 1u8 << (7 - (pos % BITS_PER_BYTE));
        let byte = &mut bytes[(pos / BITS_PER_BYTE) as usize];
        if (value >> (u64::from(bits) - 1 - i)) & 1 == 1 {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

/// Read one field out of a packed buffer that starts at byte 0
#[inline]
pub fn read_field(bytes: &[u8], field: FieldDescriptor) -> u16 {
    read_bits(bytes, field.bit_offset(), field.bits)
}

/// Write one field into a packed buffer that starts at byte 0
#[inline]
pub fn write_field(bytes: &mut Vec<u8>, field: FieldDescriptor, value: u16) {
    write_bits(bytes, field.bit_offset(), field.bits, value)
}

/// Decode `count` consecutive fields from the start of `bytes`
pub fn decode_fields(bytes: &[u8], bits: u8, count: usize) -> Vec<u16> {
    (0..count as u64)
        .map(|slot| read_field(bytes, FieldDescriptor::new(bits, slot)))
        .collect()
}
