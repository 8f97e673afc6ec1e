//! Resource resolution against the discovery catalog.
//!
//! Callers may name a resource by kind (`Pod`), singular (`pod`) or plural
//! (`pods`). Watches need the plural, so every request goes through
//! [`Resolver::normalize`] before a watch loop is started.

use std::sync::Arc;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::Client;
use tracing::debug;

use crate::error::BridgeError;
use crate::request::{formatted_gv, WatchRequest};

/// Read-only view of the API server's discovery endpoints.
#[async_trait::async_trait]
pub trait DiscoveryCatalog: Send + Sync {
    /// All resource descriptors served under a group-version key
    /// (`v1` or `group/version`).
    async fn resources_for(&self, group_version: &str) -> Result<Vec<APIResource>, BridgeError>;
}

/// Discovery catalog backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeDiscovery {
    client: Client,
}

impl std::fmt::Debug for KubeDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeDiscovery").finish_non_exhaustive()
    }
}

impl KubeDiscovery {
    /// Create a catalog over an existing client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DiscoveryCatalog for KubeDiscovery {
    async fn resources_for(&self, group_version: &str) -> Result<Vec<APIResource>, BridgeError> {
        // Core group lives under /api, everything else under /apis
        let list = if group_version.contains('/') {
            self.client.list_api_group_resources(group_version).await
        } else {
            self.client.list_core_api_resources(group_version).await
        }
        .map_err(|e| BridgeError::Discovery {
            group_version: group_version.to_string(),
            reason: e.to_string(),
        })?;
        Ok(list.resources)
    }
}

/// The descriptor a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Canonical plural name, e.g. `pods`
    pub plural: String,
    /// Kind, e.g. `Pod`
    pub kind: String,
    /// Whether the resource lives in namespaces
    pub namespaced: bool,
}

/// Resolves loosely named resources to their canonical plural.
#[derive(Clone)]
pub struct Resolver {
    catalog: Arc<dyn DiscoveryCatalog>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver over a discovery catalog.
    #[must_use]
    pub fn new(catalog: Arc<dyn DiscoveryCatalog>) -> Self {
        Self { catalog }
    }

    /// Find the descriptor whose singular or plural name equals `resource`.
    ///
    /// `resource` is compared as given; callers lower-case it first. The
    /// first matching descriptor in catalog order wins.
    pub async fn resolve(
        &self,
        group: &str,
        version: &str,
        resource: &str,
    ) -> Result<ResolvedResource, BridgeError> {
        let group_version = formatted_gv(group, version);
        let resources = self.catalog.resources_for(&group_version).await?;

        let found = resources
            .iter()
            .find(|r| r.singular_name == resource || r.name == resource)
            .ok_or_else(|| BridgeError::ResourceNotFound(resource.to_string()))?;

        debug!(
            requested = resource,
            plural = %found.name,
            kind = %found.kind,
            "Resolved resource in {}",
            group_version
        );

        Ok(ResolvedResource {
            plural: found.name.clone(),
            kind: found.kind.clone(),
            namespaced: found.namespaced,
        })
    }

    /// Lower-case the requested resource and replace it with its plural.
    ///
    /// Returns the normalized copy together with the matched descriptor.
    pub async fn normalize(
        &self,
        request: &WatchRequest,
    ) -> Result<(WatchRequest, ResolvedResource), BridgeError> {
        let mut normalized = request.clone();
        normalized.resource = normalized.resource.to_lowercase();

        let resolved = self
            .resolve(&normalized.group, &normalized.version, &normalized.resource)
            .await?;
        normalized.resource.clone_from(&resolved.plural);

        Ok((normalized, resolved))
    }
}
