//! # Shared Types Crate
//!
//! Hashes, addresses and the host client's transaction type, shared by the
//! hashgraph consensus engine and the node runtime.

pub mod entities;

pub use entities::*;
