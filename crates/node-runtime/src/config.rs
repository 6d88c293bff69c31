//! # Node Configuration
//!
//! Everything is read from the environment once at startup:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `HG_OPERATOR_ID` | operator account, `shard.realm.num` | required |
//! | `HG_OPERATOR_KEY` | Ed25519 private key, raw or DER hex | required |
//! | `HG_TOPIC_ID` | topic blocks are sealed to | required |
//! | `HG_MAX_FEE` | fee ceiling per message, tinybars | `100000000` |
//! | `HG_NETWORK` | `mainnet`, `testnet` or `previewnet` | `testnet` |
//! | `HG_SUBMIT_TIMEOUT_SECS` | timeout per log call | `30` |
//! | `HG_BLOCK_INTERVAL_SECS` | dev block interval, `0` disables | `5` |
//! | `HG_LOG_LEVEL` | filter used when `RUST_LOG` is unset | `info` |

use hg_consensus::HashgraphConfig;
use std::time::Duration;

const DEFAULT_MAX_FEE: u64 = 100_000_000;
const DEFAULT_BLOCK_INTERVAL_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum NodeConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{var} must be a non-negative integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub hashgraph: HashgraphConfig,
    /// `None` when block production is disabled.
    pub block_interval: Option<Duration>,
    pub log_level: String,
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, NodeConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, NodeConfigError> {
        let required = |var: &'static str| lookup(var).ok_or(NodeConfigError::Missing(var));
        let number = |var: &'static str, default: u64| -> Result<u64, NodeConfigError> {
            match lookup(var) {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| NodeConfigError::NotANumber { var, value }),
            }
        };

        let mut hashgraph = HashgraphConfig::new(
            required("HG_OPERATOR_ID")?,
            required("HG_OPERATOR_KEY")?,
            required("HG_TOPIC_ID")?,
            number("HG_MAX_FEE", DEFAULT_MAX_FEE)?,
        );
        if let Some(network) = lookup("HG_NETWORK") {
            hashgraph.network = network;
        }
        hashgraph.submit_timeout_secs =
            number("HG_SUBMIT_TIMEOUT_SECS", hashgraph.submit_timeout_secs)?;

        let interval_secs = number("HG_BLOCK_INTERVAL_SECS", DEFAULT_BLOCK_INTERVAL_SECS)?;
        let block_interval = match interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            hashgraph,
            block_interval,
            log_level: lookup("HG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}
