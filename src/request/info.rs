//! Classified request description

use crate::model::Verb;
use serde::Serialize;

/// Resource-oriented description of an inbound HTTP request
///
/// Derived per request and never persisted. An empty `namespace` means the
/// request targets cluster scope; an empty `name` means a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRequest {
    pub verb: Verb,
    pub is_resource_request: bool,
    /// Request path without query string
    pub path: String,
    pub api_prefix: String,
    pub api_group: String,
    pub api_version: String,
    pub namespace: String,
    pub resource: String,
    pub subresource: String,
    pub name: String,
}

impl ClassifiedRequest {
    /// A request outside every API prefix (static assets, health checks, docs)
    pub fn non_resource(method: &str, path: &str) -> Self {
        Self {
            verb: Verb::Raw(method.to_ascii_lowercase()),
            is_resource_request: false,
            path: path.to_string(),
            api_prefix: String::new(),
            api_group: String::new(),
            api_version: String::new(),
            namespace: String::new(),
            resource: String::new(),
            subresource: String::new(),
            name: String::new(),
        }
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }

    /// `resource` or `resource/subresource`
    pub fn resource_path(&self) -> String {
        if self.subresource.is_empty() {
            self.resource.clone()
        } else {
            format!("{}/{}", self.resource, self.subresource)
        }
    }
}
