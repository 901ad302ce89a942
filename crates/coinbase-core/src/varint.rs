//! Bitcoin compact-size integers.
//!
//! ```text
//! value < 0xfd         -> [value]
//! value <= 0xffff      -> [0xfd] [u16 LE]
//! value <= 0xffffffff  -> [0xfe] [u32 LE]
//! otherwise            -> [0xff] [u64 LE]
//! ```

use crate::error::DecodeError;

/// Encode a compact-size integer using the minimal form for its value.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut output = Vec::with_capacity(9);
    write_varint(value, &mut output);
    output
}

/// Append the compact-size encoding of `value` to `output`.
pub fn write_varint(value: u64, output: &mut Vec<u8>) {
    if value < 0xfd {
        output.push(value as u8);
    } else if value <= 0xffff {
        output.push(0xfd);
        output.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        output.push(0xfe);
        output.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        output.push(0xff);
        output.extend_from_slice(&value.to_le_bytes());
    }
}

/// Number of bytes `encode_varint(value)` produces.
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Decode a compact-size integer from the start of `input`.
///
/// Returns the value and the number of bytes consumed. Encodings that use a
/// wider form than the value needs are rejected.
pub fn decode_varint(input: &[u8]) -> Result<(u64, usize), DecodeError> {
    let (&prefix, rest) = input.split_first().ok_or(DecodeError::UnexpectedEof)?;

    let (value, width, min) = match prefix {
        0xfd => (read_le(rest, 2)?, 2, 0xfd),
        0xfe => (read_le(rest, 4)?, 4, 0x1_0000),
        0xff => (read_le(rest, 8)?, 8, 0x1_0000_0000),
        n => return Ok((n as u64, 1)),
    };

    if value < min {
        return Err(DecodeError::NonCanonicalVarInt);
    }

    Ok((value, 1 + width))
}

fn read_le(input: &[u8], width: usize) -> Result<u64, DecodeError> {
    let bytes = input.get(..width).ok_or(DecodeError::UnexpectedEof)?;
    Ok(bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64))
}
