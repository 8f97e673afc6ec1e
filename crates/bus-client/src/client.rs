//! NATS publisher backed by `async-nats`

use crate::error::BusError;
use crate::publisher_trait::Publisher;
use bytes::Bytes;
use tracing::{debug, info};

/// Publisher over a single shared NATS connection.
///
/// `async_nats::Client` is a cheap handle onto one connection task, so
/// cloning a `NatsPublisher` does not open another connection.
#[derive(Debug, Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
}

impl NatsPublisher {
    /// Connect to the NATS server at `url`.
    ///
    /// Fails immediately if the server cannot be reached so that the
    /// process does not start without a bus.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url).await?;
        info!("Connected to NATS at {}", url);
        Ok(Self { client })
    }

    /// Wrap an existing connection.
    #[must_use]
    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, subject: &str, payload: Bytes) -> Result<(), BusError> {
        let size = payload.len();
        self.client
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| BusError::Publish {
                subject: subject.to_string(),
                reason: e.to_string(),
            })?;
        debug!(subject, size, "Message handed to NATS");
        Ok(())
    }

    async fn flush(&self) -> Result<(), BusError> {
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Flush(e.to_string()))
    }
}
