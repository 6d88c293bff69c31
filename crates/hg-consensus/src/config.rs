//! Credential and topic configuration
//!
//! `HashgraphConfig` is the raw, string-typed record handed to the engine.
//! [`HashgraphConfig::resolve`] validates it into a [`ResolvedConfig`] without
//! touching the network.
//!
//! ## Security
//!
//! The operator key is secret material. It is never logged, and both
//! `HashgraphConfig` and [`OperatorKey`] redact it in their `Debug` output.

use crate::domain::{AccountId, Hbar, Network, TopicId};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// DER prefix of a PKCS#8-wrapped Ed25519 private key.
const ED25519_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// Configuration errors.
///
/// Fatal at construction: no engine is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed operator account id: {0:?}")]
    InvalidOperatorId(String),

    /// Carries no key text.
    #[error("operator private key could not be parsed")]
    InvalidOperatorKey,

    #[error("malformed topic id: {0:?}")]
    InvalidTopicId(String),

    #[error("unknown network: {0:?}")]
    UnknownNetwork(String),
}

/// Raw engine configuration.
#[derive(Clone, Deserialize)]
pub struct HashgraphConfig {
    /// Operator account, `shard.realm.num`.
    pub operator_id: String,
    /// Operator Ed25519 private key, hex (raw or DER).
    pub operator_key: String,
    /// Topic receiving block transactions, `shard.realm.num`.
    pub topic_id: String,
    /// Maximum fee per submitted message, in tinybars.
    pub max_fee: u64,
    /// Log deployment to connect to.
    #[serde(default = "default_network")]
    pub network: String,
    /// Upper bound on each submit or receipt round trip.
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
    /// Maximum allowed header timestamp drift into the future.
    #[serde(default = "default_max_future_drift_secs")]
    pub max_future_drift_secs: u64,
    /// Number of recently sealed blocks whose receipts are kept in memory.
    #[serde(default = "default_receipt_cache_blocks")]
    pub receipt_cache_blocks: usize,
}

fn default_network() -> String {
    Network::default().to_string()
}

fn default_submit_timeout_secs() -> u64 {
    30
}

fn default_max_future_drift_secs() -> u64 {
    15
}

fn default_receipt_cache_blocks() -> usize {
    256
}

impl HashgraphConfig {
    /// Configuration with defaults for everything except the credentials.
    pub fn new(
        operator_id: impl Into<String>,
        operator_key: impl Into<String>,
        topic_id: impl Into<String>,
        max_fee: u64,
    ) -> Self {
        Self {
            operator_id: operator_id.into(),
            operator_key: operator_key.into(),
            topic_id: topic_id.into(),
            max_fee,
            network: default_network(),
            submit_timeout_secs: default_submit_timeout_secs(),
            max_future_drift_secs: default_max_future_drift_secs(),
            receipt_cache_blocks: default_receipt_cache_blocks(),
        }
    }

    /// Validate operator id, operator key and topic id, in that order.
    ///
    /// The first failure is returned.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let operator_id: AccountId = self
            .operator_id
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidOperatorId(self.operator_id.clone()))?;

        let operator_key = OperatorKey::from_hex(&self.operator_key)?;

        let topic_id: TopicId = self
            .topic_id
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidTopicId(self.topic_id.clone()))?;

        let network: Network = self
            .network
            .parse()
            .map_err(|_| ConfigError::UnknownNetwork(self.network.clone()))?;

        Ok(ResolvedConfig {
            operator_id,
            operator_key,
            topic_id,
            max_fee: Hbar::from_tinybars(self.max_fee),
            network,
            submit_timeout: Duration::from_secs(self.submit_timeout_secs),
            max_future_drift_secs: self.max_future_drift_secs,
            receipt_cache_blocks: self.receipt_cache_blocks,
        })
    }
}

impl fmt::Debug for HashgraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashgraphConfig")
            .field("operator_id", &self.operator_id)
            .field("operator_key", &"<redacted>")
            .field("topic_id", &self.topic_id)
            .field("max_fee", &self.max_fee)
            .field("network", &self.network)
            .field("submit_timeout_secs", &self.submit_timeout_secs)
            .field("max_future_drift_secs", &self.max_future_drift_secs)
            .field("receipt_cache_blocks", &self.receipt_cache_blocks)
            .finish()
    }
}

/// Operator signing key.
#[derive(Clone)]
pub struct OperatorKey(SigningKey);

impl OperatorKey {
    /// Parse a hex Ed25519 private key: 32 raw bytes or the DER-wrapped form.
    pub fn from_hex(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s).to_ascii_lowercase();
        let raw = digits
            .strip_prefix(ED25519_DER_PREFIX)
            .unwrap_or(digits.as_str());
        if raw.len() != 64 {
            return Err(ConfigError::InvalidOperatorKey);
        }

        let mut seed = [0u8; 32];
        hex::decode_to_slice(raw, &mut seed).map_err(|_| ConfigError::InvalidOperatorKey)?;
        Ok(Self(SigningKey::from_bytes(&seed)))
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.0.verifying_key()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.0.sign(message)
    }
}

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OperatorKey(public: {}, private: <redacted>)",
            hex::encode(self.public_key().as_bytes())
        )
    }
}

/// Validated configuration.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub operator_id: AccountId,
    pub operator_key: OperatorKey,
    pub topic_id: TopicId,
    pub max_fee: Hbar,
    pub network: Network,
    pub submit_timeout: Duration,
    pub max_future_drift_secs: u64,
    pub receipt_cache_blocks: usize,
}
