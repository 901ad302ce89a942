//! Coinbase transaction construction for pool mining.
//!
//! A pool hands each miner a job made of a block height, two opaque script
//! fragments, the lengths of the two extra-nonces and the outputs to pay.
//! The coinbase input script is laid out as:
//!
//! ```text
//! [height push] [prefix] [push(enonce1 ++ enonce2)] [postfix] [padding]
//! ```
//!
//! Bitshare hashers consume the coinbase without its last output (the one the
//! pool adds) and lock-time, and compute a SHA256 midstate over it. That
//! truncated stream must therefore end on a 512-bit boundary, which the
//! padding at the end of the input script guarantees.

use log::{debug, trace, warn};

use crate::error::CoinbaseError;
use crate::hash::{sha256_midstate, Midstate, SHA256_BLOCK_SIZE};
use crate::script::push_bytes;
use crate::transaction::{Transaction, TransactionInput, TransactionOutput};
use crate::varint::varint_len;

/// Largest coinbase script accepted by consensus.
pub const MAX_COINBASE_SCRIPT_SIZE: usize = 100;

/// Fill byte of the placeholder enonce1 used to size the padding.
const ENONCE1_PLACEHOLDER: u8 = 0xee;
/// Fill byte of the placeholder enonce2 used to size the padding.
const ENONCE2_PLACEHOLDER: u8 = 0xdd;

/// Bits in one SHA256 message block.
const BLOCK_BITS: usize = SHA256_BLOCK_SIZE * 8;

/// A coinbase whose serialization can drop its last output and lock-time.
///
/// The last output is taken to be the one added by the pool. Its serialized
/// length is recorded at construction, and the transaction cannot be mutated
/// afterwards, so the recorded length always matches the output present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinbaseTransaction {
    tx: Transaction,
    trailing_output_len: usize,
}

impl CoinbaseTransaction {
    pub fn new(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u32,
    ) -> Result<Self, CoinbaseError> {
        Self::from_transaction(Transaction::new(version, inputs, outputs, lock_time))
    }

    /// Wrap `tx`, recording the length of its last output.
    ///
    /// Fails with [`CoinbaseError::MalformedOutputs`] if `tx` has no outputs.
    pub fn from_transaction(tx: Transaction) -> Result<Self, CoinbaseError> {
        let trailing_output_len = tx
            .outputs
            .last()
            .map(TransactionOutput::serialized_len)
            .ok_or(CoinbaseError::MalformedOutputs)?;

        Ok(CoinbaseTransaction {
            tx,
            trailing_output_len,
        })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn into_transaction(self) -> Transaction {
        self.tx
    }

    /// Serialized length of the pool-added last output.
    pub fn trailing_output_len(&self) -> usize {
        self.trailing_output_len
    }

    /// Full wire serialization.
    pub fn serialize(&self) -> Vec<u8> {
        self.tx.serialize()
    }

    /// Number of leading bytes [`client_serialize`](Self::client_serialize) keeps.
    pub fn client_len(&self) -> usize {
        self.tx.serialized_len() - self.removed_len()
    }

    /// Serialization without the last output and the lock-time.
    ///
    /// This is the byte stream a Bitshare hasher computes its midstate over.
    pub fn client_serialize(&self) -> Vec<u8> {
        let mut bytes = self.tx.serialize();
        bytes.truncate(bytes.len() - self.removed_len());
        bytes
    }

    /// The bytes [`client_serialize`](Self::client_serialize) drops: the last
    /// output followed by the lock-time.
    pub fn client_tail(&self) -> Vec<u8> {
        let bytes = self.tx.serialize();
        bytes[bytes.len() - self.removed_len()..].to_vec()
    }

    /// SHA256 midstate over [`client_serialize`](Self::client_serialize).
    ///
    /// Fails with [`CoinbaseError::UnalignedMidstate`] when the client bytes
    /// were not padded to a 512-bit boundary.
    pub fn client_midstate(&self) -> Result<Midstate, CoinbaseError> {
        sha256_midstate(&self.client_serialize())
    }

    fn removed_len(&self) -> usize {
        self.trailing_output_len + Transaction::LOCK_TIME_LEN
    }
}

/// Result of [`CoinbaseBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltCoinbase {
    /// Padded coinbase supporting client serialization.
    Bitshare(CoinbaseTransaction),
    /// Unpadded coinbase.
    Plain(Transaction),
}

impl BuiltCoinbase {
    pub fn transaction(&self) -> &Transaction {
        match self {
            BuiltCoinbase::Bitshare(cb) => cb.transaction(),
            BuiltCoinbase::Plain(tx) => tx,
        }
    }

    pub fn into_transaction(self) -> Transaction {
        match self {
            BuiltCoinbase::Bitshare(cb) => cb.into_transaction(),
            BuiltCoinbase::Plain(tx) => tx,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.transaction().serialize()
    }

    /// Client serialization, available only for Bitshare coinbases.
    pub fn client_serialize(&self) -> Option<Vec<u8>> {
        self.as_bitshare().map(CoinbaseTransaction::client_serialize)
    }

    pub fn as_bitshare(&self) -> Option<&CoinbaseTransaction> {
        match self {
            BuiltCoinbase::Bitshare(cb) => Some(cb),
            BuiltCoinbase::Plain(_) => None,
        }
    }

    pub fn is_bitshare(&self) -> bool {
        self.as_bitshare().is_some()
    }
}

/// Builder for the coinbase transactions of one mining job.
///
/// Everything except the extra-nonce values is fixed at construction, so the
/// Bitshare padding is computed once and reused by every [`build`](Self::build).
/// The builder is immutable afterwards and may be shared across threads.
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    /// Block height, pushed first in the input script (BIP34).
    height: u32,
    /// Caller-supplied bytes placed before the extra-nonce push.
    script_prefix: Vec<u8>,
    /// Caller-supplied bytes placed after the extra-nonce push.
    script_postfix: Vec<u8>,
    enonce1_len: usize,
    enonce2_len: usize,
    /// Outputs to pay; the last one is the pool-added output.
    outputs: Vec<TransactionOutput>,
    lock_time: u32,
    version: u32,
    bitshare_padding: Vec<u8>,
}

impl CoinbaseBuilder {
    /// Create a builder for a job and compute its Bitshare padding.
    ///
    /// # Arguments
    /// * `height` - The block height
    /// * `script_prefix` - Bytes placed before the extra-nonce push
    /// * `script_postfix` - Bytes placed after the extra-nonce push
    /// * `enonce1_len` - Length of the pool-assigned extra-nonce
    /// * `enonce2_len` - Length of the miner-assigned extra-nonce
    /// * `outputs` - Outputs to pay, ending with the pool-added output
    /// * `lock_time` - Transaction lock-time
    pub fn new(
        height: u32,
        script_prefix: Vec<u8>,
        script_postfix: Vec<u8>,
        enonce1_len: usize,
        enonce2_len: usize,
        outputs: Vec<TransactionOutput>,
        lock_time: u32,
    ) -> Result<Self, CoinbaseError> {
        if outputs.is_empty() {
            return Err(CoinbaseError::MalformedOutputs);
        }

        let mut builder = CoinbaseBuilder {
            height,
            script_prefix,
            script_postfix,
            enonce1_len,
            enonce2_len,
            outputs,
            lock_time,
            version: Transaction::DEFAULT_VERSION,
            bitshare_padding: Vec::new(),
        };

        builder.bitshare_padding = builder.required_padding()?;

        debug!(
            "coinbase job at height {}: enonces {}+{} bytes, {} outputs, {} bytes of padding",
            height,
            enonce1_len,
            enonce2_len,
            builder.outputs.len(),
            builder.bitshare_padding.len()
        );

        let script_len = builder.build_placeholder_input()?.script_sig.len()
            + builder.bitshare_padding.len();
        if script_len > MAX_COINBASE_SCRIPT_SIZE {
            warn!(
                "coinbase script of {} bytes exceeds the consensus limit of {}",
                script_len, MAX_COINBASE_SCRIPT_SIZE
            );
        }

        Ok(builder)
    }

    /// Set the transaction version (default 1).
    ///
    /// The version field has a fixed width, so the padding is unaffected.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn enonce1_len(&self) -> usize {
        self.enonce1_len
    }

    pub fn enonce2_len(&self) -> usize {
        self.enonce2_len
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Padding appended to the input script of Bitshare coinbases.
    pub fn padding(&self) -> &[u8] {
        &self.bitshare_padding
    }

    /// Build a coinbase input from the given extra-nonces.
    ///
    /// Lengths are not checked here; [`build`](Self::build) does that.
    pub fn build_input(
        &self,
        enonce1: &[u8],
        enonce2: &[u8],
        padding: Option<&[u8]>,
    ) -> Result<TransactionInput, CoinbaseError> {
        let mut enonce = Vec::with_capacity(enonce1.len() + enonce2.len());
        enonce.extend_from_slice(enonce1);
        enonce.extend_from_slice(enonce2);
        let enonce_push = push_bytes(&enonce)?;

        let padding = padding.unwrap_or_default();
        let mut script = Vec::with_capacity(
            self.script_prefix.len()
                + enonce_push.len()
                + self.script_postfix.len()
                + padding.len(),
        );
        script.extend_from_slice(&self.script_prefix);
        script.extend_from_slice(&enonce_push);
        script.extend_from_slice(&self.script_postfix);
        script.extend_from_slice(padding);

        Ok(TransactionInput::coinbase(self.height, &script))
    }

    /// Build an input with fixed fill bytes in place of the extra-nonces.
    pub fn build_placeholder_input(&self) -> Result<TransactionInput, CoinbaseError> {
        let enonce1 = vec![ENONCE1_PLACEHOLDER; self.enonce1_len];
        let enonce2 = vec![ENONCE2_PLACEHOLDER; self.enonce2_len];
        self.build_input(&enonce1, &enonce2, None)
    }

    /// Padding that brings the client serialization to a 512-bit boundary.
    ///
    /// Only the configured lengths matter, so placeholder extra-nonces are used.
    pub fn required_padding(&self) -> Result<Vec<u8>, CoinbaseError> {
        let placeholder = self.assemble(self.build_placeholder_input()?)?;

        let client_bits = placeholder.client_len() * 8;
        let padding_bits = (BLOCK_BITS - client_bits % BLOCK_BITS) % BLOCK_BITS;
        if padding_bits % 8 != 0 {
            return Err(CoinbaseError::AlignmentInvariantViolation { bits: padding_bits });
        }

        // Padding that widens the script length prefix shifts everything after
        // it, so the prefix growth is taken out of the padding. If that drops
        // the script back under the threshold, a whole block is added instead.
        let script_len = placeholder.transaction().inputs[0].script_sig.len() as u64;
        let prefix_growth =
            |len: usize| varint_len(script_len + len as u64) - varint_len(script_len);

        let mut len = padding_bits / 8;
        let growth = prefix_growth(len);
        if growth > 0 {
            len = (len + SHA256_BLOCK_SIZE - growth % SHA256_BLOCK_SIZE) % SHA256_BLOCK_SIZE;
            if prefix_growth(len) != growth {
                len += SHA256_BLOCK_SIZE;
            }
            debug!(
                "coinbase script length prefix grows by {} bytes, using {} bytes of padding",
                growth, len
            );
        }

        let padding = bitshare_padding(len)?;
        debug_assert_eq!(
            (placeholder.client_len() + prefix_growth(len) + len) % SHA256_BLOCK_SIZE,
            0
        );

        Ok(padding)
    }

    /// Build the coinbase for one pair of extra-nonces.
    ///
    /// With `bitshare` set, the precomputed padding is appended to the input
    /// script and the result supports client serialization.
    pub fn build(
        &self,
        enonce1: &[u8],
        enonce2: &[u8],
        bitshare: bool,
    ) -> Result<BuiltCoinbase, CoinbaseError> {
        check_len("enonce1", self.enonce1_len, enonce1)?;
        check_len("enonce2", self.enonce2_len, enonce2)?;

        trace!(
            "building coinbase: enonce1={} enonce2={} bitshare={}",
            hex::encode(enonce1),
            hex::encode(enonce2),
            bitshare
        );

        if bitshare {
            let input = self.build_input(enonce1, enonce2, Some(self.bitshare_padding.as_slice()))?;
            self.assemble(input).map(BuiltCoinbase::Bitshare)
        } else {
            let input = self.build_input(enonce1, enonce2, None)?;
            Ok(BuiltCoinbase::Plain(Transaction::new(
                self.version,
                vec![input],
                self.outputs.clone(),
                self.lock_time,
            )))
        }
    }

    fn assemble(&self, input: TransactionInput) -> Result<CoinbaseTransaction, CoinbaseError> {
        CoinbaseTransaction::new(self.version, vec![input], self.outputs.clone(), self.lock_time)
    }
}

fn check_len(field: &'static str, expected: usize, value: &[u8]) -> Result<(), CoinbaseError> {
    if value.len() != expected {
        return Err(CoinbaseError::LengthMismatch {
            field,
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}

/// Encode `len` bytes of Bitshare padding.
///
/// ```text
/// 0   -> (nothing)
/// 1   -> 00
/// n>1 -> [n-1] followed by n-1 bytes of n-1
/// ```
///
/// For `1 < n <= 76` the padding is itself a direct push of `n - 1` bytes.
/// The builder never needs more than two blocks' worth; lengths whose
/// leading byte cannot hold `n - 1` are rejected.
pub fn bitshare_padding(len: usize) -> Result<Vec<u8>, CoinbaseError> {
    match len {
        0 => Ok(Vec::new()),
        1 => Ok(vec![0x00]),
        n => {
            let fill = u8::try_from(n - 1).map_err(|_| CoinbaseError::PaddingTooLong { len })?;
            Ok(vec![fill; n])
        }
    }
}
