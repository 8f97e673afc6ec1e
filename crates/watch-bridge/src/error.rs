//! Bridge error types.
//!
//! Synchronous errors (`InvalidRequest`) reach the HTTP caller. Everything
//! else happens after the topic has been handed out and is only logged.

use bus_client::BusError;
use thiserror::Error;

/// Errors that can occur in the watch bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Request body is not a well-formed watch request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Discovery has no resource with that singular or plural name
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Discovery catalog unreachable or returned garbage
    #[error("Failed to fetch resource list for {group_version}: {reason}")]
    Discovery {
        /// Group-version key that was queried
        group_version: String,
        /// Underlying cause
        reason: String,
    },

    /// Object or envelope could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bus refused the message
    #[error("Publish error: {0}")]
    Publish(#[from] BusError),

    /// Watch loop could not be constructed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
