//! Error types for coinbase construction and transaction parsing.

use thiserror::Error;

/// Errors raised while configuring a coinbase builder or building a coinbase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinbaseError {
    /// A supplied extra-nonce does not have the configured length.
    #[error("{field} length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The padding needed for 512-bit alignment is not a whole number of bytes.
    #[error("required coinbase padding of {bits} bits is not a multiple of 8")]
    AlignmentInvariantViolation { bits: usize },
    /// A coinbase transaction needs at least one output.
    #[error("coinbase transaction requires at least one output")]
    MalformedOutputs,
    /// Push data exceeds the maximum script element size.
    #[error("push data of {len} bytes exceeds the maximum element size of {max}")]
    PushTooLarge { len: usize, max: usize },
    /// Padding length cannot be described by its leading byte.
    #[error("coinbase padding of {len} bytes cannot be encoded")]
    PaddingTooLong { len: usize },
    /// Midstate input must consist of whole SHA256 blocks.
    #[error("midstate input of {len} bytes is not a multiple of 64")]
    UnalignedMidstate { len: usize },
}

/// A job configuration that could not be read or written as JSON.
#[derive(Debug, Error)]
#[error("invalid coinbase configuration: {0}")]
pub struct ConfigError(#[from] serde_json::Error);

impl ConfigError {
    /// Line of the offending input, starting at 1 (0 when not applicable).
    pub fn line(&self) -> usize {
        self.0.line()
    }

    /// Column of the offending input, starting at 1 (0 when not applicable).
    pub fn column(&self) -> usize {
        self.0.column()
    }
}

/// Errors raised while parsing a serialized transaction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The input ended before the structure was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A compact-size integer used a longer form than necessary.
    #[error("non-canonical compact size encoding")]
    NonCanonicalVarInt,
    /// A decoded length does not fit in memory on this platform.
    #[error("encoded length overflows usize")]
    LengthOverflow,
    /// Bytes remained after the transaction was fully parsed.
    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),
    /// The hex string could not be decoded.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
