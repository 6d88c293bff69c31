//! Domain layer for the hashgraph consensus engine

mod block;
mod error;
mod identity;
mod memo;
mod receipt;

pub use block::*;
pub use error::*;
pub use identity::*;
pub use memo::*;
pub use receipt::*;

/// Largest transaction encoding accepted as a single log message.
pub const MAX_MESSAGE_BYTES: usize = 4000;
