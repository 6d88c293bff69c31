//! # Core Domain Entities
//!
//! Primitive chain types shared by the consensus engine and the node runtime.
//!
//! ## Encoding
//!
//! Transactions have a single canonical wire encoding (JSON with hex-encoded
//! byte strings). The same bytes are submitted to the consensus log and hashed
//! into the block's transactions root, so both sides must agree on them.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Compute the Keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash {
    Keccak256::digest(data.as_ref()).into()
}

/// Format a hash as `0x`-prefixed lowercase hex.
pub fn hash_to_hex(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-prefixed (or bare) 64-character hex string into a hash.
pub fn hash_from_hex(s: &str) -> Option<Hash> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 64 {
        return None;
    }
    let mut hash = ZERO_HASH;
    hex::decode_to_slice(digits, &mut hash).ok()?;
    Some(hash)
}

/// A signed transaction as produced by the host client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's nonce to prevent replay attacks.
    pub nonce: u64,
    /// Sender address.
    #[serde(with = "hex_address")]
    pub from: Address,
    /// Recipient address (absent for contract creation).
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex_address_opt")]
    pub to: Option<Address>,
    /// Transferred value in base units.
    pub value: U256,
    /// Gas price in base units.
    pub gas_price: U256,
    /// Gas limit for this transaction.
    pub gas_limit: u64,
    /// Call data.
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Sender's signature over the transaction body.
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Canonical wire encoding.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a transaction from its canonical wire encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Keccak-256 of the canonical encoding.
    pub fn hash(&self) -> Result<Hash, serde_json::Error> {
        Ok(keccak256(self.encode()?))
    }
}

/// Root over a list of transaction hashes: `keccak256(h_0 || h_1 || ...)`.
///
/// The empty list hashes to `keccak256("")`.
pub fn transactions_root<'a>(hashes: impl IntoIterator<Item = &'a Hash>) -> Hash {
    let mut hasher = Keccak256::new();
    for hash in hashes {
        hasher.update(hash);
    }
    hasher.finalize().into()
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}

mod hex_address {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(address)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut address = [0u8; 20];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(&s), &mut address)
            .map_err(serde::de::Error::custom)?;
        Ok(address)
    }
}

mod hex_address_opt {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        address: &Option<Address>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match address {
            Some(a) => serializer.serialize_str(&format!("0x{}", hex::encode(a))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Address>, D::Error> {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let mut address = [0u8; 20];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(&s), &mut address)
            .map_err(serde::de::Error::custom)?;
        Ok(Some(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            nonce: 7,
            from: [0x11; 20],
            to: Some([0x22; 20]),
            value: U256::from(1_000u64),
            gas_price: U256::from(1u64),
            gas_limit: 21_000,
            data: vec![0xde, 0xad, 0xbe, 0xef],
            signature: vec![0x01; 65],
        }
    }

    #[test]
    fn test_encoding_is_stable_and_decodable() {
        let tx = sample_tx();
        let first = tx.encode().unwrap();
        let second = tx.encode().unwrap();
        assert_eq!(first, second);
        assert_eq!(Transaction::decode(&first).unwrap(), tx);
    }

    #[test]
    fn test_data_bytes_cost_two_encoded_chars() {
        let mut tx = sample_tx();
        tx.data.clear();
        let base = tx.encode().unwrap().len();
        tx.data = vec![0xff; 10];
        assert_eq!(tx.encode().unwrap().len(), base + 20);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let hash = keccak256(b"hashgraph");
        let hex = hash_to_hex(&hash);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);
        assert_eq!(hash_from_hex(&hex), Some(hash));
        assert_eq!(hash_from_hex("0xabc"), None);
    }

    #[test]
    fn test_transactions_root_depends_on_order() {
        let a = keccak256(b"a");
        let b = keccak256(b"b");
        assert_ne!(transactions_root([&a, &b]), transactions_root([&b, &a]));
        assert_eq!(transactions_root(std::iter::empty::<&Hash>()), keccak256(b""));
    }
}
