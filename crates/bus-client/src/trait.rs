//! Publisher trait for mocking
//!
//! The concrete [`NatsPublisher`](crate::NatsPublisher) implements this trait,
//! and tests use [`MockPublisher`](crate::mock::MockPublisher) instead.

use crate::error::BusError;
use bytes::Bytes;

/// Trait for message bus publish operations
///
/// Implementations must be safe for concurrent use: every watch loop in the
/// process publishes through the same handle.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Send one payload to `subject`.
    ///
    /// Best effort: no retry and no queueing beyond what the underlying
    /// connection does. The error is the only delivery signal.
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError>;

    /// Write out anything the connection has buffered.
    async fn flush(&self) -> Result<(), BusError> {
        Ok(())
    }
}
