//! Driven ports (Outbound dependencies)

use crate::domain::{Header, LogError, LogMessage, LogRecord, Receipt, TopicId, TransactionId};
use async_trait::async_trait;
use shared_types::Hash;

/// Session with the external consensus log.
///
/// A client is bound to one operator identity. It never retries internally.
/// After [`LogClient::close`], `submit` and `receipt` fail with
/// [`LogError::Closed`].
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Submit a message. Returns once the log has accepted the transaction.
    async fn submit(&self, message: &LogMessage) -> Result<TransactionId, LogError>;

    /// Wait for the receipt of a previously submitted transaction.
    async fn receipt(&self, transaction_id: &TransactionId) -> Result<Receipt, LogError>;

    /// Messages on `topic_id` whose memo references `block_hash`, in
    /// consensus order.
    async fn block_records(
        &self,
        topic_id: &TopicId,
        block_hash: &Hash,
    ) -> Result<Vec<LogRecord>, LogError>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&self) -> Result<(), LogError>;
}

/// Read access to the host client's chain.
pub trait ChainReader: Send + Sync {
    /// Header currently at the head of the chain.
    fn current_header(&self) -> Option<Header>;

    /// Header with the given hash and number.
    fn header(&self, hash: &Hash, number: u64) -> Option<Header>;

    /// Canonical header at `number`.
    fn header_by_number(&self, number: u64) -> Option<Header>;
}

/// The host client's state database, as seen during finalization.
pub trait StateDb: Send {
    /// State root after all changes applied so far.
    fn intermediate_root(&mut self) -> Hash;
}

/// Time source for timestamp validation
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
