//! # Sealing Metrics
//!
//! Prometheus metrics for the hashgraph sealing path.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hg-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `hashgraph_blocks_sealed_total` - Blocks sealed on the consensus log
//! - `hashgraph_messages_submitted_total` - Log messages accepted with a success receipt
//! - `hashgraph_seal_failures_total` - Failed seal attempts (by reason)
//! - `hashgraph_seal_latency_seconds` - Time from seal start to sealed block

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_SEALED: IntCounter = register_int_counter!(
        "hashgraph_blocks_sealed_total",
        "Total number of blocks sealed on the consensus log"
    )
    .expect("Failed to create BLOCKS_SEALED metric");

    pub static ref MESSAGES_SUBMITTED: IntCounter = register_int_counter!(
        "hashgraph_messages_submitted_total",
        "Total number of log messages accepted with a success receipt"
    )
    .expect("Failed to create MESSAGES_SUBMITTED metric");

    /// Failed seal attempts, labeled by error reason
    pub static ref SEAL_FAILURES: CounterVec = register_counter_vec!(
        "hashgraph_seal_failures_total",
        "Total number of failed seal attempts",
        &["reason"]
    )
    .expect("Failed to create SEAL_FAILURES metric");

    pub static ref SEAL_LATENCY: Histogram = register_histogram!(
        "hashgraph_seal_latency_seconds",
        "Time taken to seal a block in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create SEAL_LATENCY metric");
}

#[cfg(feature = "metrics")]
pub fn record_block_sealed() {
    BLOCKS_SEALED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_message_submitted() {
    MESSAGES_SUBMITTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_seal_failed(reason: &str) {
    SEAL_FAILURES.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_seal_latency(seconds: f64) {
    SEAL_LATENCY.observe(seconds);
}

#[cfg(not(feature = "metrics"))]
pub fn record_block_sealed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_message_submitted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_seal_failed(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_seal_latency(_seconds: f64) {}
