//! Watch requests and topic naming.

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// A request to watch one kind of resource.
///
/// Every field defaults to an empty string when missing from the JSON body.
/// `resource` may be a kind, a singular or a plural name in any case; it is
/// normalized by [`Resolver::normalize`](crate::Resolver::normalize).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchRequest {
    /// API group, empty for the core group
    pub group: String,
    /// API version, e.g. `v1`
    pub version: String,
    /// Resource name or kind
    pub resource: String,
    /// Namespace to watch, empty for all namespaces
    pub namespace: String,
}

impl WatchRequest {
    /// Build a request from its four fields.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
            namespace: namespace.into(),
        }
    }

    /// Parse and validate a raw request body.
    ///
    /// The body must be a JSON object; `version` and `resource` must be
    /// non-empty.
    pub fn from_json(body: &[u8]) -> Result<Self, BridgeError> {
        let request: Self = serde_json::from_slice(body)
            .map_err(|e| BridgeError::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    /// Check the required fields.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.version.trim().is_empty() {
            return Err(BridgeError::InvalidRequest("version is required".to_string()));
        }
        if self.resource.trim().is_empty() {
            return Err(BridgeError::InvalidRequest("resource is required".to_string()));
        }
        Ok(())
    }

    /// Topic that events for this request are published on.
    #[must_use]
    pub fn topic(&self) -> String {
        topic_for(self)
    }

    /// Namespace as an option, `None` meaning cluster-wide.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        (!self.namespace.is_empty()).then_some(self.namespace.as_str())
    }
}

/// Discovery key for a group/version: `version` for the core group,
/// `group/version` otherwise.
#[must_use]
pub fn formatted_gv(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{group}/{version}")
    }
}

/// Topic name: `k8s[.<group>].<version>.<resource>[.<namespace>]`, lower-cased.
///
/// Empty group and namespace segments are left out entirely.
#[must_use]
pub fn topic_for(request: &WatchRequest) -> String {
    let mut parts = vec!["k8s".to_string()];
    if !request.group.is_empty() {
        parts.push(request.group.to_lowercase());
    }
    parts.push(request.version.to_lowercase());
    parts.push(request.resource.to_lowercase());
    if !request.namespace.is_empty() {
        parts.push(request.namespace.to_lowercase());
    }
    parts.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_gv() {
        assert_eq!(formatted_gv("", "v1"), "v1");
        assert_eq!(formatted_gv("apps", "v1"), "apps/v1");
        assert_eq!(formatted_gv("networking.k8s.io", "v1"), "networking.k8s.io/v1");
    }

    #[test]
    fn test_topic_for() {
        let cases = [
            (WatchRequest::new("apps", "v1", "deployments", "default"), "k8s.apps.v1.deployments.default"),
            (WatchRequest::new("", "v1", "pods", "default"), "k8s.v1.pods.default"),
            (WatchRequest::new("networking.k8s.io", "v1", "ingresses", ""), "k8s.networking.k8s.io.v1.ingresses"),
            (WatchRequest::new("", "v1", "services", ""), "k8s.v1.services"),
        ];
        for (request, expected) in cases {
            assert_eq!(topic_for(&request), expected, "topic for {request:?}");
        }
    }

    #[test]
    fn test_topic_lowercases_every_segment() {
        let request = WatchRequest::new("Apps", "V1", "Deployment", "Kube-System");
        assert_eq!(request.topic(), "k8s.apps.v1.deployment.kube-system");
    }

    #[test]
    fn test_topic_is_idempotent() {
        let request = WatchRequest::new("batch", "v1", "CronJobs", "jobs");
        assert_eq!(request.topic(), request.topic());
        assert_eq!(request.topic(), request.clone().topic());
    }

    #[test]
    fn test_from_json_defaults_missing_fields() {
        let request = WatchRequest::from_json(br#"{"version":"v1","resource":"pods"}"#).unwrap();
        assert_eq!(request, WatchRequest::new("", "v1", "pods", ""));
        assert_eq!(request.namespace(), None);
    }

    #[test]
    fn test_from_json_ignores_unknown_fields() {
        let request = WatchRequest::from_json(
            br#"{"group":"apps","version":"v1","resource":"deployments","namespace":"web","extra":1}"#,
        )
        .unwrap();
        assert_eq!(request.namespace(), Some("web"));
    }

    #[test]
    fn test_from_json_rejects_malformed_body() {
        assert!(matches!(
            WatchRequest::from_json(b"{not json"),
            Err(BridgeError::InvalidRequest(_))
        ));
        assert!(matches!(
            WatchRequest::from_json(br#"{"version":1,"resource":"pods"}"#),
            Err(BridgeError::InvalidRequest(_))
        ));
        assert!(matches!(
            WatchRequest::from_json(br#"["v1","pods"]"#),
            Err(BridgeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_from_json_requires_version_and_resource() {
        assert!(matches!(
            WatchRequest::from_json(br#"{"resource":"pods"}"#),
            Err(BridgeError::InvalidRequest(msg)) if msg.contains("version")
        ));
        assert!(matches!(
            WatchRequest::from_json(br#"{"version":"v1","resource":""}"#),
            Err(BridgeError::InvalidRequest(msg)) if msg.contains("resource")
        ));
    }
}
