//! Adapters layer (Hexagonal Architecture)

mod in_memory_log;

pub use in_memory_log::*;
