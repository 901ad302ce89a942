//! Mining job configuration.
//!
//! A job is usually delivered as JSON by the pool; byte fields are hex:
//!
//! ```json
//! {
//!   "height": 500000,
//!   "prefix": "0102",
//!   "postfix": "03",
//!   "enonce1_len": 4,
//!   "enonce2_len": 4,
//!   "outputs": [{ "value": 0, "script_pubkey": "76a914...88ac" }],
//!   "lock_time": 0
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::coinbase::CoinbaseBuilder;
use crate::error::{CoinbaseError, ConfigError};
use crate::transaction::{Transaction, TransactionOutput};

/// One output of the coinbase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Amount in satoshis.
    pub value: u64,
    #[serde(with = "hex::serde")]
    pub script_pubkey: Vec<u8>,
}

impl From<&OutputConfig> for TransactionOutput {
    fn from(output: &OutputConfig) -> Self {
        TransactionOutput::new(output.value, output.script_pubkey.clone())
    }
}

/// Parameters fixed for the lifetime of a mining job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseConfig {
    pub height: u32,
    #[serde(with = "hex::serde", default)]
    pub prefix: Vec<u8>,
    #[serde(with = "hex::serde", default)]
    pub postfix: Vec<u8>,
    pub enonce1_len: usize,
    pub enonce2_len: usize,
    /// Outputs in order; the last is the pool-added output.
    pub outputs: Vec<OutputConfig>,
    #[serde(default)]
    pub lock_time: u32,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    Transaction::DEFAULT_VERSION
}

impl CoinbaseConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl CoinbaseBuilder {
    /// Create a builder from a job configuration.
    pub fn from_config(config: &CoinbaseConfig) -> Result<Self, CoinbaseError> {
        let builder = CoinbaseBuilder::new(
            config.height,
            config.prefix.clone(),
            config.postfix.clone(),
            config.enonce1_len,
            config.enonce2_len,
            config.outputs.iter().map(TransactionOutput::from).collect(),
            config.lock_time,
        )?;
        Ok(builder.with_version(config.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB: &str = r#"{
        "height": 500000,
        "prefix": "0102",
        "postfix": "03",
        "enonce1_len": 4,
        "enonce2_len": 4,
        "outputs": [
            { "value": 0, "script_pubkey": "76a914212121212121212121212121212121212121212188ac" }
        ]
    }"#;

    #[test]
    fn test_parse_job() {
        let config = CoinbaseConfig::from_json(JOB).unwrap();

        assert_eq!(config.height, 500_000);
        assert_eq!(config.prefix, vec![0x01, 0x02]);
        assert_eq!(config.postfix, vec![0x03]);
        assert_eq!(config.outputs.len(), 1);
        assert_eq!(config.outputs[0].script_pubkey.len(), 25);
        assert_eq!(config.lock_time, 0);
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_builder_from_config() {
        let config = CoinbaseConfig::from_json(JOB).unwrap();
        let builder = CoinbaseBuilder::from_config(&config).unwrap();

        assert_eq!(builder.height(), 500_000);
        assert_eq!(builder.padding(), &[0x00]);

        let built = builder.build(&[0; 4], &[0; 4], true).unwrap();
        assert_eq!(built.client_serialize().unwrap().len(), 64);
    }

    #[test]
    fn test_json_round_trip() {
        let config = CoinbaseConfig::from_json(JOB).unwrap();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"prefix\":\"0102\""));
        assert_eq!(CoinbaseConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_hex_rejected() {
        let json = JOB.replace("\"0102\"", "\"01zz\"");
        let err = CoinbaseConfig::from_json(&json).unwrap_err();
        assert_eq!(err.line(), 3);
        assert!(err.to_string().starts_with("invalid coinbase configuration"));
    }

    #[test]
    fn test_missing_field_reports_position() {
        let err = CoinbaseConfig::from_json(r#"{ "height": 1 }"#).unwrap_err();
        assert!(err.to_string().contains("enonce1_len"));
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_empty_outputs_rejected() {
        let mut config = CoinbaseConfig::from_json(JOB).unwrap();
        config.outputs.clear();
        assert_eq!(
            CoinbaseBuilder::from_config(&config).unwrap_err(),
            CoinbaseError::MalformedOutputs
        );
    }
}
