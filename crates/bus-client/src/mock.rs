//! Mock publisher for unit testing
//!
//! Records every message in memory and can be switched into a failing mode
//! to exercise publish-error handling without a running NATS server.

use crate::error::BusError;
use crate::publisher_trait::Publisher;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A message captured by [`MockPublisher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Subject the message was published on
    pub subject: String,
    /// Raw payload
    pub payload: Bytes,
}

/// In-memory publisher for tests
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    messages: Arc<Mutex<Vec<PublishedMessage>>>,
    fail: Arc<AtomicBool>,
    flushes: Arc<AtomicUsize>,
}

impl MockPublisher {
    /// Create a new mock publisher that accepts every message
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of everything published so far
    pub fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of times `flush` was called
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BusError::Publish {
                subject: subject.to_string(),
                reason: "mock publisher is failing".to_string(),
            });
        }
        self.messages.lock().unwrap().push(PublishedMessage {
            subject: subject.to_string(),
            payload,
        });
        Ok(())
    }

    async fn flush(&self) -> Result<(), BusError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
