//! Wire envelope published for every change.
//!
//! ```json
//! {"eventType": "UPDATE", "details": "{\"apiVersion\":\"v1\",...}"}
//! ```
//!
//! `details` carries the object as a JSON *string*, not a nested object.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Kind of change observed on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Object appeared
    Add,
    /// Object changed, or was replayed by a resync
    Update,
    /// Object went away
    Delete,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// `ADD`, `UPDATE` or `DELETE`
    pub event_type: EventType,
    /// JSON encoding of the resource object
    pub details: String,
}

impl EventEnvelope {
    /// Wrap an object snapshot.
    pub fn new<T: Serialize + ?Sized>(object: &T, event_type: EventType) -> Result<Self, BridgeError> {
        Ok(Self {
            event_type,
            details: serde_json::to_string(object)?,
        })
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Bytes, BridgeError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// Serialize `object` into envelope bytes ready to publish.
///
/// Fails with [`BridgeError::Serialization`] if either the object or the
/// envelope cannot be encoded; nothing should be published in that case.
pub fn build<T: Serialize + ?Sized>(object: &T, event_type: EventType) -> Result<Bytes, BridgeError> {
    EventEnvelope::new(object, event_type)?.to_bytes()
}
