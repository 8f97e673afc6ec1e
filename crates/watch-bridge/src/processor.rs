//! Turns informer callbacks into published envelopes.

use std::sync::Arc;

use bus_client::Publisher;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::envelope::{self, EventType};
use crate::error::BridgeError;
use crate::informer::EventHandler;

/// Publishes every change of one watch loop on a fixed topic.
///
/// Failures are logged per event and never propagate into the informer, so
/// one bad object cannot stop an otherwise healthy watch.
#[derive(Clone)]
pub struct EventProcessor {
    topic: String,
    publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProcessor")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl EventProcessor {
    /// Create a processor publishing on `topic`.
    pub fn new(topic: impl Into<String>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            topic: topic.into(),
            publisher,
        }
    }

    /// Topic this processor publishes on
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Encode `object` and publish it. Nothing is published if encoding fails.
    pub async fn process<T>(&self, object: &T, event_type: EventType) -> Result<(), BridgeError>
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = envelope::build(object, event_type)?;
        debug!(%event_type, bytes = payload.len(), "Publishing event to {}", self.topic);

        self.publisher.publish(&self.topic, payload).await?;
        info!("Event {} published to NATS topic: {}", event_type, self.topic);
        Ok(())
    }

    async fn dispatch<T>(&self, object: &T, event_type: EventType)
    where
        T: Serialize + Sync + ?Sized,
    {
        match self.process(object, event_type).await {
            Ok(()) => {}
            Err(e @ BridgeError::Serialization(_)) => {
                error!("JSON conversion failed for {} event: {}", event_type, e);
            }
            Err(e) => {
                error!("Failed to publish {} event to topic {}: {}", event_type, self.topic, e);
            }
        }
    }
}

#[async_trait::async_trait]
impl<K> EventHandler<K> for EventProcessor
where
    K: Serialize + Send + Sync + 'static,
{
    async fn on_add(&self, object: &K) {
        self.dispatch(object, EventType::Add).await;
    }

    async fn on_update(&self, _old: &K, new: &K) {
        self.dispatch(new, EventType::Update).await;
    }

    async fn on_delete(&self, object: &K) {
        self.dispatch(object, EventType::Delete).await;
    }
}
