//! Watch orchestration.
//!
//! The [`Orchestrator`] takes a raw [`WatchRequest`], resolves it, and starts
//! one background watch loop whose callbacks publish on the request's topic.
//! Loops are independent: two identical requests start two loops that
//! publish the same events on the same topic.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bus_client::Publisher;
use kube::api::{Api, DynamicObject};
use kube::core::{ApiResource, GroupVersionKind};
use kube::Client;
use kube_runtime::{watcher, WatchStreamExt};
use tokio::runtime::Handle;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::error::BridgeError;
use crate::informer::{EventHandler, Informer, DEFAULT_RESYNC};
use crate::processor::EventProcessor;
use crate::request::{formatted_gv, WatchRequest};
use crate::resolver::{ResolvedResource, Resolver};

/// Canonical identity of one watch loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedIdentity {
    /// API group, empty for core
    pub group: String,
    /// API version
    pub version: String,
    /// Canonical plural resource name
    pub resource: String,
    /// Kind reported by discovery
    pub kind: String,
    /// Requested namespace, `None` for cluster-wide
    pub namespace: Option<String>,
    /// Whether the resource is namespace-scoped
    pub namespaced: bool,
}

impl ResolvedIdentity {
    /// Combine a normalized request with its discovery descriptor.
    #[must_use]
    pub fn new(normalized: &WatchRequest, resolved: &ResolvedResource) -> Self {
        Self {
            group: normalized.group.clone(),
            version: normalized.version.clone(),
            resource: resolved.plural.clone(),
            kind: resolved.kind.clone(),
            namespace: normalized.namespace().map(str::to_string),
            namespaced: resolved.namespaced,
        }
    }

    /// Dynamic API type for this identity.
    #[must_use]
    pub fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, &self.kind);
        ApiResource::from_gvk_with_plural(&gvk, &self.resource)
    }

    /// Namespace the watch is scoped to.
    ///
    /// Cluster-scoped resources are always watched cluster-wide.
    #[must_use]
    pub fn watch_namespace(&self) -> Option<&str> {
        if self.namespaced {
            self.namespace.as_deref()
        } else {
            None
        }
    }
}

impl fmt::Display for ResolvedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", formatted_gv(&self.group, &self.version), self.resource)?;
        match self.watch_namespace() {
            Some(ns) => write!(f, " in namespace {ns}"),
            None => write!(f, " in all namespaces"),
        }
    }
}

/// Starts watch loops for resolved identities.
pub trait WatchSource: Send + Sync {
    /// Spawn a loop delivering changes of `identity` to `handler`.
    ///
    /// Returns once the loop is running; the loop itself lives until
    /// process exit.
    fn start(
        &self,
        identity: &ResolvedIdentity,
        handler: Arc<dyn EventHandler<DynamicObject>>,
    ) -> Result<(), BridgeError>;
}

/// Watch source over the Kubernetes dynamic API.
#[derive(Clone)]
pub struct KubeWatchSource {
    client: Client,
    resync: Duration,
}

impl fmt::Debug for KubeWatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeWatchSource")
            .field("resync", &self.resync)
            .finish_non_exhaustive()
    }
}

impl KubeWatchSource {
    /// Create a source with the default resync period.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            resync: DEFAULT_RESYNC,
        }
    }

    /// Override the resync period.
    #[must_use]
    pub fn with_resync(mut self, resync: Duration) -> Self {
        self.resync = resync;
        self
    }
}

impl WatchSource for KubeWatchSource {
    fn start(
        &self,
        identity: &ResolvedIdentity,
        handler: Arc<dyn EventHandler<DynamicObject>>,
    ) -> Result<(), BridgeError> {
        let runtime = Handle::try_current()
            .map_err(|e| BridgeError::Watch(format!("no async runtime to run watch on: {e}")))?;

        let ar = identity.api_resource();
        let api: Api<DynamicObject> = match identity.watch_namespace() {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        };

        let stream = watcher(api, watcher::Config::default()).default_backoff();
        let informer = Informer::new(self.resync);

        runtime.spawn(informer.run(stream, handler).instrument(Span::current()));
        Ok(())
    }
}

/// Anything that can serve a watch request.
#[async_trait::async_trait]
pub trait WatchService: Send + Sync {
    /// Resolve `request` and start its watch loop.
    ///
    /// Returns after the loop is started; resolution errors are returned,
    /// errors inside the loop are only logged.
    async fn watch(&self, request: WatchRequest) -> Result<(), BridgeError>;
}

/// Resolves requests and wires watch loops to the publisher.
#[derive(Clone)]
pub struct Orchestrator {
    resolver: Resolver,
    source: Arc<dyn WatchSource>,
    publisher: Arc<dyn Publisher>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators.
    #[must_use]
    pub fn new(resolver: Resolver, source: Arc<dyn WatchSource>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            resolver,
            source,
            publisher,
        }
    }
}

#[async_trait::async_trait]
impl WatchService for Orchestrator {
    async fn watch(&self, request: WatchRequest) -> Result<(), BridgeError> {
        // Same topic the gateway handed back, so derived from the raw request
        let topic = request.topic();

        let (normalized, resolved) = self.resolver.normalize(&request).await?;
        let identity = ResolvedIdentity::new(&normalized, &resolved);

        let watch_id = Uuid::new_v4();
        let span = info_span!("watch", %watch_id, %topic, resource = %identity.resource);

        span.in_scope(|| {
            if identity.namespace.is_some() && !identity.namespaced {
                warn!(
                    "{} is cluster-scoped, ignoring namespace {:?}",
                    identity.resource, identity.namespace
                );
            }
            info!("Starting watch for {}", identity);

            let handler = Arc::new(EventProcessor::new(topic.clone(), Arc::clone(&self.publisher)));
            self.source.start(&identity, handler)
        })
    }
}
