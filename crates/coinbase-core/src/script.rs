//! Script byte sequences and push-data encoding.
//!
//! Only the pieces a coinbase needs are modelled: concatenation of opaque
//! fragments, minimal data pushes and minimal integer pushes.

use std::fmt;

use crate::error::CoinbaseError;

/// Largest element a script may push onto the stack.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Largest direct push; longer data uses an `OP_PUSHDATA` form.
pub const MAX_DIRECT_PUSH: usize = 75;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;

/// An ordered sequence of opcode and push-data bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    /// Create an empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Append raw bytes without any push prefix.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    /// Append a minimal push of `data`.
    pub fn push_slice(&mut self, data: &[u8]) -> Result<&mut Self, CoinbaseError> {
        self.0.extend_from_slice(&push_bytes(data)?);
        Ok(self)
    }

    /// Append a minimal push of the integer `n`.
    pub fn push_int(&mut self, n: i64) -> &mut Self {
        self.0.extend_from_slice(&push_int(n));
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Encode `data` as a single push operation.
///
/// Data of up to 75 bytes is prefixed with its length; longer data uses
/// `OP_PUSHDATA1` or `OP_PUSHDATA2`. Data longer than
/// [`MAX_SCRIPT_ELEMENT_SIZE`] is rejected.
pub fn push_bytes(data: &[u8]) -> Result<Vec<u8>, CoinbaseError> {
    let len = data.len();
    if len > MAX_SCRIPT_ELEMENT_SIZE {
        return Err(CoinbaseError::PushTooLarge {
            len,
            max: MAX_SCRIPT_ELEMENT_SIZE,
        });
    }

    let mut out = Vec::with_capacity(len + 3);
    if len <= MAX_DIRECT_PUSH {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    }
    out.extend_from_slice(data);
    Ok(out)
}

/// Encode `n` with the smallest push that leaves it on the stack.
///
/// 0 becomes `OP_0`, -1 and 1..=16 use their dedicated opcodes, and any other
/// value is pushed as a script number (little-endian magnitude with a sign bit).
/// This is the form BIP34 requires for the block height.
pub fn push_int(n: i64) -> Vec<u8> {
    match n {
        0 => vec![OP_0],
        -1 => vec![OP_1NEGATE],
        1..=16 => vec![OP_1 + (n as u8 - 1)],
        _ => {
            let num = script_num(n);
            let mut out = Vec::with_capacity(num.len() + 1);
            out.push(num.len() as u8);
            out.extend_from_slice(&num);
            out
        }
    }
}

/// Serialize `n` as a minimally encoded script number.
pub fn script_num(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut bytes = Vec::with_capacity(9);
    while abs > 0 {
        bytes.push((abs & 0xff) as u8);
        abs >>= 8;
    }

    // The top bit of the last byte is the sign; add a byte if it is taken.
    if let Some(last) = bytes.last_mut() {
        if *last & 0x80 != 0 {
            bytes.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            *last |= 0x80;
        }
    }

    bytes
}
