//! Bitcoin transaction model and canonical (non-witness) wire encoding.
//!
//! ```text
//! [version u32 LE] [input count] [inputs] [output count] [outputs] [lock_time u32 LE]
//! input:  [prev txid 32] [prev vout u32 LE] [script len] [script] [sequence u32 LE]
//! output: [value u64 LE] [script len] [script]
//! ```
//!
//! Field values are held in host representation and converted to
//! little-endian only when serializing.

use crate::error::DecodeError;
use crate::hash::{double_sha256, hash_to_display_hex};
use crate::script::{push_int, Script};
use crate::varint::{decode_varint, varint_len, write_varint};

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction id in internal byte order.
    pub txid: [u8; 32],
    pub vout: u32,
}

impl OutPoint {
    /// The outpoint every coinbase input carries: zero txid, maximal index.
    pub const fn null() -> Self {
        OutPoint {
            txid: [0u8; 32],
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub outpoint: OutPoint,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TransactionInput {
    /// Sequence number that disables relative lock-time and replacement.
    pub const MAX_SEQUENCE: u32 = 0xffff_ffff;

    pub fn new(outpoint: OutPoint, script_sig: Script, sequence: u32) -> Self {
        TransactionInput {
            outpoint,
            script_sig,
            sequence,
        }
    }

    /// Build a coinbase input for `height`.
    ///
    /// The script is the BIP34 height push followed by `raw_script` verbatim.
    pub fn coinbase(height: u32, raw_script: &[u8]) -> Self {
        let mut script = Script::from(push_int(height as i64));
        script.push_raw(raw_script);
        TransactionInput::new(OutPoint::null(), script, Self::MAX_SEQUENCE)
    }

    pub fn is_coinbase(&self) -> bool {
        self.outpoint.is_null()
    }

    pub fn serialized_len(&self) -> usize {
        32 + 4 + varint_len(self.script_sig.len() as u64) + self.script_sig.len() + 4
    }

    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.outpoint.txid);
        out.extend_from_slice(&self.outpoint.vout.to_le_bytes());
        write_varint(self.script_sig.len() as u64, out);
        out.extend_from_slice(self.script_sig.as_bytes());
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }

    fn deserialize_from(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let txid = reader.read_array::<32>()?;
        let vout = reader.read_u32()?;
        let script_len = reader.read_len()?;
        let script_sig = Script::from(reader.read_bytes(script_len)?);
        let sequence = reader.read_u32()?;

        Ok(TransactionInput {
            outpoint: OutPoint { txid, vout },
            script_sig,
            sequence,
        })
    }
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Amount in satoshis.
    pub value: u64,
    pub script_pubkey: Script,
}

impl TransactionOutput {
    pub fn new(value: u64, script_pubkey: impl Into<Script>) -> Self {
        TransactionOutput {
            value,
            script_pubkey: script_pubkey.into(),
        }
    }

    pub fn serialized_len(&self) -> usize {
        8 + varint_len(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        self.serialize_into(&mut out);
        out
    }

    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_varint(self.script_pubkey.len() as u64, out);
        out.extend_from_slice(self.script_pubkey.as_bytes());
    }

    fn deserialize_from(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let value = reader.read_u64()?;
        let script_len = reader.read_len()?;
        let script_pubkey = Script::from(reader.read_bytes(script_len)?);

        Ok(TransactionOutput {
            value,
            script_pubkey,
        })
    }
}

/// A Bitcoin transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    /// Earliest time or block height at which the transaction is final.
    pub lock_time: u32,
}

impl Transaction {
    pub const DEFAULT_VERSION: u32 = 1;

    /// Size of the trailing lock-time field.
    pub const LOCK_TIME_LEN: usize = 4;

    pub fn new(
        version: u32,
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
        lock_time: u32,
    ) -> Self {
        Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        }
    }

    /// Serialize the transaction in wire order.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());

        out.extend_from_slice(&self.version.to_le_bytes());

        write_varint(self.inputs.len() as u64, &mut out);
        for input in &self.inputs {
            input.serialize_into(&mut out);
        }

        write_varint(self.outputs.len() as u64, &mut out);
        for output in &self.outputs {
            output.serialize_into(&mut out);
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());

        out
    }

    /// Length of [`Transaction::serialize`] without building it.
    pub fn serialized_len(&self) -> usize {
        4 + varint_len(self.inputs.len() as u64)
            + self.inputs.iter().map(TransactionInput::serialized_len).sum::<usize>()
            + varint_len(self.outputs.len() as u64)
            + self.outputs.iter().map(TransactionOutput::serialized_len).sum::<usize>()
            + Self::LOCK_TIME_LEN
    }

    /// Parse a transaction, requiring that `bytes` holds exactly one.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);

        let version = reader.read_u32()?;

        let input_count = reader.read_len()?;
        let mut inputs = Vec::with_capacity(input_count.min(reader.remaining()));
        for _ in 0..input_count {
            inputs.push(TransactionInput::deserialize_from(&mut reader)?);
        }

        let output_count = reader.read_len()?;
        let mut outputs = Vec::with_capacity(output_count.min(reader.remaining()));
        for _ in 0..output_count {
            outputs.push(TransactionOutput::deserialize_from(&mut reader)?);
        }

        let lock_time = reader.read_u32()?;

        match reader.remaining() {
            0 => Ok(Transaction {
                version,
                inputs,
                outputs,
                lock_time,
            }),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }

    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        Self::deserialize(&hex::decode(s)?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id (double SHA256 of the serialization), internal byte order.
    pub fn txid(&self) -> [u8; 32] {
        double_sha256(&self.serialize())
    }

    /// Transaction id as it is usually displayed.
    pub fn txid_hex(&self) -> String {
        hash_to_display_hex(&self.txid())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }
}

/// Cursor over a serialized transaction.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::LengthOverflow)?;
        let slice = self.data.get(self.pos..end).ok_or(DecodeError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        self.read_slice(len).map(<[u8]>::to_vec)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array::<4>().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Result<u64, DecodeError> {
        self.read_array::<8>().map(u64::from_le_bytes)
    }

    fn read_len(&mut self) -> Result<usize, DecodeError> {
        let (value, consumed) = decode_varint(&self.data[self.pos..])?;
        self.pos += consumed;
        usize::try_from(value).map_err(|_| DecodeError::LengthOverflow)
    }
}
