//! NATS Bus Client
//!
//! Publishing side of the message bus used by the watch bridge.
//!
//! The bridge only ever needs one operation from the bus: put a payload on
//! a subject. That operation is abstracted behind [`Publisher`] so that the
//! watch pipeline can be unit tested without a running NATS server.
//!
//! # Example
//!
//! ```no_run
//! use bus_client::{NatsPublisher, Publisher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let publisher = NatsPublisher::connect("nats://localhost:4222").await?;
//! publisher
//!     .publish("k8s.v1.pods.default", bytes::Bytes::from_static(b"{}"))
//!     .await?;
//! publisher.flush().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod publisher_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::NatsPublisher;
pub use error::BusError;
pub use publisher_trait::Publisher;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockPublisher, PublishedMessage};
