//! Watch Bridge
//!
//! Republishes Kubernetes resource changes onto NATS topics.
//!
//! A caller posts a loosely specified resource reference (group, version,
//! resource name or kind, namespace). The bridge answers straight away with
//! the topic the events will appear on, then in the background:
//!
//! 1. resolves the reference to a canonical plural resource via discovery
//!    ([`resolver`]),
//! 2. starts a watch/cache loop over the dynamic API ([`informer`],
//!    [`orchestrator`]),
//! 3. wraps every add/update/delete into an [`envelope::EventEnvelope`] and
//!    publishes it on the topic ([`processor`]).
//!
//! The HTTP surface lives in [`gateway`] and is served by [`server::Server`].

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod informer;
pub mod orchestrator;
pub mod processor;
pub mod request;
pub mod resolver;
pub mod server;
#[cfg(test)]
mod test_utils;

pub use envelope::{EventEnvelope, EventType};
pub use error::BridgeError;
pub use informer::{CacheKey, EventHandler, Informer, DEFAULT_RESYNC};
pub use orchestrator::{KubeWatchSource, Orchestrator, ResolvedIdentity, WatchService, WatchSource};
pub use processor::EventProcessor;
pub use request::{formatted_gv, topic_for, WatchRequest};
pub use resolver::{DiscoveryCatalog, KubeDiscovery, ResolvedResource, Resolver};
pub use server::{AppState, Server};
