//! Compact unsigned-integer encoding.
//!
//! The two leading bits of the first byte select the length:
//! - `0xxxxxxx`: 1 byte, 7-bit value (0..=127)
//! - `10xxxxxx`: 2 bytes, 14-bit big-endian value (128..=16383)
//! - `11xxxxxx`: 4 bytes, 30-bit big-endian value (16384..=0x3FFF_FFFF)
//!
//! Encoding always picks the shortest form; decoding rejects over-long forms
//! so every value has exactly one representation.

use super::constants::VARINT_MAX;
use super::error::{DecodeError, EncodeError};

/// Number of bytes `value` occupies when encoded.
#[inline]
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        _ => 4,
    }
}

/// Append the shortest encoding of `value` to `out`.
pub fn encode(value: u32, out: &mut Vec<u8>) -> Result<usize, EncodeError> {
    match value {
        0..=0x7F => {
            out.push(value as u8);
            Ok(1)
        }
        0x80..=0x3FFF => {
            out.push(0x80 | (value >> 8) as u8);
            out.push(value as u8);
            Ok(2)
        }
        0x4000..=VARINT_MAX => {
            out.push(0xC0 | (value >> 24) as u8);
            out.push((value >> 16) as u8);
            out.push((value >> 8) as u8);
            out.push(value as u8);
            Ok(4)
        }
        _ => Err(EncodeError::VarintOverflow(value)),
    }
}

/// Encode into a fresh vector.
pub fn to_vec(value: u32) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(4);
    encode(value, &mut out)?;
    Ok(out)
}

/// Decode a varint at the start of `bytes`, returning `(value, consumed)`.
pub fn decode(bytes: &[u8]) -> Result<(u32, usize), DecodeError> {
    let Some(&first) = bytes.first() else {
        return Err(DecodeError::UnexpectedEof { offset: 0 });
    };

    match first >> 6 {
        0 | 1 => Ok((first as u32, 1)),
        2 => {
            let Some(&b1) = bytes.get(1) else {
                return Err(DecodeError::UnexpectedEof { offset: 1 });
            };
            let value = ((first as u32 & 0x3F) << 8) | b1 as u32;
            if value < 0x80 {
                return Err(DecodeError::NonCanonicalVarint { offset: 0 });
            }
            Ok((value, 2))
        }
        _ => {
            if bytes.len() < 4 {
                return Err(DecodeError::UnexpectedEof {
                    offset: bytes.len(),
                });
            }
            let value = ((first as u32 & 0x3F) << 24)
                | (bytes[1] as u32) << 16
                | (bytes[2] as u32) << 8
                | bytes[3] as u32;
            if value < 0x4000 {
                return Err(DecodeError::NonCanonicalVarint { offset: 0 });
            }
            Ok((value, 4))
        }
    }
}

/// Length of the varint starting at `bytes[0]` without decoding the value.
///
/// Only the tag and the available length are checked.
#[inline]
pub fn peek_len(bytes: &[u8]) -> Result<usize, DecodeError> {
    let Some(&first) = bytes.first() else {
        return Err(DecodeError::UnexpectedEof { offset: 0 });
    };
    let len = match first >> 6 {
        0 | 1 => 1,
        2 => 2,
        _ => 4,
    };
    if bytes.len() < len {
        return Err(DecodeError::UnexpectedEof {
            offset: bytes.len(),
        });
    }
    Ok(len)
}
