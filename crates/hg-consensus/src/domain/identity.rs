//! Operator and topic identities on the consensus log
//!
//! Entity identifiers use the `shard.realm.num` form. An optional
//! `-checksum` suffix (five lowercase letters) is accepted and ignored.

use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::fmt;
use std::str::FromStr;

/// Tinybars per hbar.
pub const TINYBARS_PER_HBAR: u64 = 100_000_000;

/// Parse `shard.realm.num[-checksum]` into its three components.
fn parse_entity(s: &str) -> Option<(u64, u64, u64)> {
    let body = match s.split_once('-') {
        Some((body, checksum)) => {
            if checksum.len() != 5 || !checksum.bytes().all(|b| b.is_ascii_lowercase()) {
                return None;
            }
            body
        }
        None => s,
    };

    let mut parts = body.split('.');
    let shard = parts.next()?.parse().ok()?;
    let realm = parts.next()?.parse().ok()?;
    let num = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((shard, realm, num))
}

/// Operator account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// EVM address bound to this account: `shard(4) || realm(8) || num(8)`, big-endian.
    ///
    /// The shard is truncated to its low 32 bits.
    pub fn to_evm_address(&self) -> Address {
        let mut address = [0u8; 20];
        address[..4].copy_from_slice(&(self.shard as u32).to_be_bytes());
        address[4..12].copy_from_slice(&self.realm.to_be_bytes());
        address[12..].copy_from_slice(&self.num.to_be_bytes());
        address
    }
}

impl FromStr for AccountId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_entity(s)
            .map(|(shard, realm, num)| Self::new(shard, realm, num))
            .ok_or(())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// Destination topic on the consensus log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl TopicId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }
}

impl FromStr for TopicId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_entity(s)
            .map(|(shard, realm, num)| Self::new(shard, realm, num))
            .ok_or(())
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

/// An amount in the log's native currency, stored as tinybars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hbar(u64);

impl Hbar {
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: u64) -> Self {
        Self(tinybars)
    }

    pub const fn to_tinybars(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08} ℏ",
            self.0 / TINYBARS_PER_HBAR,
            self.0 % TINYBARS_PER_HBAR
        )
    }
}

/// Deployment of the consensus log service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
}

impl FromStr for Network {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "previewnet" => Ok(Self::Previewnet),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Previewnet => "previewnet",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_id() {
        let id: AccountId = "0.0.1234".parse().unwrap();
        assert_eq!(id, AccountId::new(0, 0, 1234));
        assert_eq!(id.to_string(), "0.0.1234");

        let with_checksum: AccountId = "0.0.1234-abcde".parse().unwrap();
        assert_eq!(with_checksum, id);
    }

    #[test]
    fn test_reject_malformed_entities() {
        for bad in ["", "0.0", "0.0.1.2", "a.b.c", "0.0.-1", "0.0.5-ABCDE", "0.0.5-abc"] {
            assert!(bad.parse::<AccountId>().is_err(), "{bad} should not parse");
            assert!(bad.parse::<TopicId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_evm_address_layout() {
        let address = AccountId::new(1, 2, 0x0102_0304).to_evm_address();
        assert_eq!(&address[..4], &[0, 0, 0, 1]);
        assert_eq!(&address[4..12], &[0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(&address[12..], &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_hbar_display() {
        assert_eq!(Hbar::from_tinybars(150_000_000).to_string(), "1.50000000 ℏ");
        assert_eq!(Hbar::from_tinybars(1).to_string(), "0.00000001 ℏ");
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("Testnet".parse::<Network>(), Ok(Network::Testnet));
        assert!("devnet".parse::<Network>().is_err());
    }
}
