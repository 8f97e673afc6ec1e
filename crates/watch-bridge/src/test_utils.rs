//! Test utilities for unit testing the bridge
//!
//! In-memory stand-ins for the discovery catalog, the watch source and the
//! watch service, plus a small object type whose serialization can be made
//! to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::api::DynamicObject;
use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::BridgeError;
use crate::informer::{CacheKey, EventHandler};
use crate::orchestrator::{ResolvedIdentity, WatchService, WatchSource};
use crate::request::WatchRequest;
use crate::resolver::DiscoveryCatalog;

/// Helper to create a discovery descriptor
pub fn api_resource(name: &str, singular: &str, kind: &str, namespaced: bool) -> APIResource {
    APIResource {
        name: name.to_string(),
        singular_name: singular.to_string(),
        kind: kind.to_string(),
        namespaced,
        verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
        ..Default::default()
    }
}

/// Discovery catalog keyed by group-version
#[derive(Clone, Default)]
pub struct MockDiscovery {
    resources: Arc<Mutex<HashMap<String, Vec<APIResource>>>>,
    queries: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(self, group_version: &str, resources: Vec<APIResource>) -> Self {
        self.resources
            .lock()
            .unwrap()
            .insert(group_version.to_string(), resources);
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DiscoveryCatalog for MockDiscovery {
    async fn resources_for(&self, group_version: &str) -> Result<Vec<APIResource>, BridgeError> {
        self.queries.lock().unwrap().push(group_version.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Discovery {
                group_version: group_version.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        // Unknown group-versions are a 404 from the API server
        self.resources
            .lock()
            .unwrap()
            .get(group_version)
            .cloned()
            .ok_or_else(|| BridgeError::Discovery {
                group_version: group_version.to_string(),
                reason: "the server could not find the requested resource".to_string(),
            })
    }
}

/// Watch source that records what it was asked to start
#[derive(Clone, Default)]
pub struct MockWatchSource {
    started: Arc<Mutex<Vec<(ResolvedIdentity, Arc<dyn EventHandler<DynamicObject>>)>>>,
    fail: Arc<AtomicBool>,
}

impl MockWatchSource {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn started(&self) -> Vec<ResolvedIdentity> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|(identity, _)| identity.clone())
            .collect()
    }

    pub fn handler(&self, index: usize) -> Arc<dyn EventHandler<DynamicObject>> {
        Arc::clone(&self.started.lock().unwrap()[index].1)
    }
}

impl WatchSource for MockWatchSource {
    fn start(
        &self,
        identity: &ResolvedIdentity,
        handler: Arc<dyn EventHandler<DynamicObject>>,
    ) -> Result<(), BridgeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BridgeError::Watch("mock watch source is failing".to_string()));
        }
        self.started.lock().unwrap().push((identity.clone(), handler));
        Ok(())
    }
}

/// Watch service that records dispatched requests
#[derive(Clone, Default)]
pub struct RecordingWatchService {
    requests: Arc<Mutex<Vec<WatchRequest>>>,
    error: Option<fn() -> BridgeError>,
}

impl RecordingWatchService {
    pub fn failing_with(error: fn() -> BridgeError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<WatchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Poll until at least `count` requests were dispatched or `timeout` passes
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<WatchRequest> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let requests = self.requests();
            if requests.len() >= count || tokio::time::Instant::now() >= deadline {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait::async_trait]
impl WatchService for RecordingWatchService {
    async fn watch(&self, request: WatchRequest) -> Result<(), BridgeError> {
        self.requests.lock().unwrap().push(request);
        match self.error {
            Some(error) => Err(error()),
            None => Ok(()),
        }
    }
}

/// Object whose serialization fails when poisoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flaky {
    pub name: String,
    pub version: u32,
    pub poisoned: bool,
}

impl Flaky {
    pub fn new(name: &str, version: u32) -> Self {
        Self {
            name: name.to_string(),
            version,
            poisoned: false,
        }
    }

    pub fn poisoned(name: &str) -> Self {
        Self {
            poisoned: true,
            ..Self::new(name, 0)
        }
    }

    fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl Serialize for Flaky {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.poisoned {
            return Err(S::Error::custom(format!("{} cannot be encoded", self.name)));
        }
        let mut state = serializer.serialize_struct("Flaky", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("version", &self.version)?;
        state.end()
    }
}

impl CacheKey for Flaky {
    fn cache_key(&self) -> String {
        self.name.clone()
    }
}

/// A value that never serializes
#[derive(Debug)]
pub struct Unserializable;

impl Serialize for Unserializable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("unserializable"))
    }
}

/// Handler recording each callback as a short string
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl EventHandler<Flaky> for RecordingHandler {
    async fn on_add(&self, object: &Flaky) {
        self.calls.lock().unwrap().push(format!("add {}", object.label()));
    }

    async fn on_update(&self, old: &Flaky, new: &Flaky) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("update {}->{}", old.label(), new.label()));
    }

    async fn on_delete(&self, object: &Flaky) {
        self.calls.lock().unwrap().push(format!("delete {}", object.label()));
    }
}
