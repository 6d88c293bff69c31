//! # Node Runtime Library
//!
//! Development node for the hashgraph consensus engine. The binary in
//! `main.rs` loads [`NodeConfig`] from the environment, builds a
//! [`NodeRuntime`] and runs it until Ctrl+C.

pub mod config;
pub mod dev_chain;
pub mod runtime;

pub use config::{NodeConfig, NodeConfigError};
pub use dev_chain::{DevChain, DevState};
pub use runtime::NodeRuntime;
