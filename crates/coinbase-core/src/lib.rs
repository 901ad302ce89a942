//! Coinbase transaction construction for pool mining.
//!
//! This crate provides pure Rust implementations of:
//! - Bitcoin compact-size integers and script push encoding
//! - Transaction serialization and parsing in the canonical wire format
//! - Coinbase transaction building from a block height and extra-nonce values
//! - 512-bit aligned client serialization for midstate-computing hashers
//! - SHA256 midstate computation and resumption

pub mod coinbase;
pub mod config;
pub mod error;
pub mod hash;
pub mod script;
pub mod transaction;
pub mod varint;

pub use coinbase::{bitshare_padding, BuiltCoinbase, CoinbaseBuilder, CoinbaseTransaction};
pub use config::{CoinbaseConfig, OutputConfig};
pub use error::{CoinbaseError, ConfigError, DecodeError};
pub use hash::{double_sha256, sha256, sha256_midstate, sha256_resume, Midstate};
pub use script::{push_bytes, push_int, Script, MAX_SCRIPT_ELEMENT_SIZE};
pub use transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput};
pub use varint::{decode_varint, encode_varint};
