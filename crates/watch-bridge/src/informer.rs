//! Callback-style watch/cache loop.
//!
//! kube-runtime's watcher yields `Apply`/`Delete` plus `Init`..`InitDone`
//! brackets around every (re)list. Subscribers of the bridge want the
//! add/update/delete view instead, so the [`Informer`] keeps the last seen
//! state of every object and turns the watcher stream into calls on an
//! [`EventHandler`].
//!
//! - `Apply`/`InitApply` of an unknown object → `on_add`
//! - `Apply`/`InitApply` of a cached object → `on_update(old, new)`
//! - `Delete` → `on_delete` with the final state
//! - objects missing from a relist → `on_delete` with the last known state
//! - every resync period, each cached object → `on_update(obj, obj)`

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use kube::api::DynamicObject;
use kube::ResourceExt;
use kube_runtime::watcher;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Resync period used for every watch loop.
pub const DEFAULT_RESYNC: Duration = Duration::from_secs(5 * 60);

/// Key an object is cached under: `namespace/name`, or `name` when
/// cluster-scoped.
pub trait CacheKey {
    /// Cache key for this object
    fn cache_key(&self) -> String;
}

impl CacheKey for DynamicObject {
    fn cache_key(&self) -> String {
        match self.namespace() {
            Some(ns) if !ns.is_empty() => format!("{}/{}", ns, self.name_any()),
            _ => self.name_any(),
        }
    }
}

/// Receiver of informer notifications.
///
/// Calls for one informer are made one at a time in delivery order.
#[async_trait::async_trait]
pub trait EventHandler<K: Send + Sync>: Send + Sync {
    /// A new object was observed
    async fn on_add(&self, object: &K);

    /// A known object changed, or is being replayed by a resync
    async fn on_update(&self, old: &K, new: &K);

    /// An object was removed
    async fn on_delete(&self, object: &K);
}

/// Local cache over a watch stream, dispatching to an [`EventHandler`].
#[derive(Debug)]
pub struct Informer<K> {
    resync: Duration,
    cache: BTreeMap<String, K>,
    relist: Option<HashSet<String>>,
}

impl<K> Informer<K>
where
    K: CacheKey + Clone + Send + Sync + 'static,
{
    /// Create an empty informer. A zero `resync` disables resync.
    #[must_use]
    pub fn new(resync: Duration) -> Self {
        Self {
            resync,
            cache: BTreeMap::new(),
            relist: None,
        }
    }

    /// Number of cached objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Last known state of an object
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&K> {
        self.cache.get(key)
    }

    /// Drive the informer until the stream ends.
    ///
    /// Stream errors are logged and skipped; the watcher re-establishes the
    /// watch on the next poll.
    pub async fn run<S, H>(mut self, stream: S, handler: Arc<H>)
    where
        S: Stream<Item = Result<watcher::Event<K>, watcher::Error>> + Send,
        H: EventHandler<K> + ?Sized,
    {
        let mut stream = Box::pin(stream);
        let mut ticker = (!self.resync.is_zero()).then(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + self.resync, self.resync);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        info!("Informer started (resync every {:?})", self.resync);

        loop {
            tokio::select! {
                next = stream.next() => match next {
                    Some(Ok(event)) => self.handle_event(event, handler.as_ref()).await,
                    Some(Err(e)) => warn!("Watch stream error: {}", e),
                    None => break,
                },
                () = tick(&mut ticker) => self.resync(handler.as_ref()).await,
            }
        }

        warn!("Watch stream ended");
    }

    /// Apply one watcher event to the cache and notify the handler.
    pub async fn handle_event<H>(&mut self, event: watcher::Event<K>, handler: &H)
    where
        H: EventHandler<K> + ?Sized,
    {
        match event {
            watcher::Event::Init => {
                debug!("Watch list started");
                self.relist = Some(HashSet::new());
            }
            watcher::Event::InitApply(object) => {
                if let Some(seen) = self.relist.as_mut() {
                    seen.insert(object.cache_key());
                }
                self.upsert(object, handler).await;
            }
            watcher::Event::InitDone => {
                if let Some(seen) = self.relist.take() {
                    self.evict_missing(&seen, handler).await;
                }
                debug!("Watch list complete, {} objects cached", self.cache.len());
            }
            watcher::Event::Apply(object) => self.upsert(object, handler).await,
            watcher::Event::Delete(object) => {
                self.cache.remove(&object.cache_key());
                handler.on_delete(&object).await;
            }
        }
    }

    /// Replay every cached object as an update.
    pub async fn resync<H>(&self, handler: &H)
    where
        H: EventHandler<K> + ?Sized,
    {
        debug!("Resyncing {} cached objects", self.cache.len());
        for object in self.cache.values() {
            handler.on_update(object, object).await;
        }
    }

    async fn upsert<H>(&mut self, object: K, handler: &H)
    where
        H: EventHandler<K> + ?Sized,
    {
        match self.cache.insert(object.cache_key(), object.clone()) {
            Some(old) => handler.on_update(&old, &object).await,
            None => handler.on_add(&object).await,
        }
    }

    // Objects deleted while the watch was down never get a Delete event.
    async fn evict_missing<H>(&mut self, seen: &HashSet<String>, handler: &H)
    where
        H: EventHandler<K> + ?Sized,
    {
        let stale: Vec<String> = self
            .cache
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();

        for key in stale {
            if let Some(last_known) = self.cache.remove(&key) {
                debug!("{} missing from relist", key);
                handler.on_delete(&last_known).await;
            }
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
