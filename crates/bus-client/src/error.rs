//! Bus client errors

use thiserror::Error;

/// Errors that can occur when talking to the message bus
#[derive(Debug, Error)]
pub enum BusError {
    /// Initial connection to the bus failed
    #[error("Failed to connect to NATS: {0}")]
    Connect(#[from] async_nats::ConnectError),

    /// The bus rejected or could not accept a message
    #[error("Failed to publish to {subject}: {reason}")]
    Publish {
        /// Subject the message was addressed to
        subject: String,
        /// Underlying cause
        reason: String,
    },

    /// Buffered messages could not be written out
    #[error("Failed to flush NATS connection: {0}")]
    Flush(String),
}
