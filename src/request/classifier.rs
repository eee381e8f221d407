//! Request classifier
//!
//! Turns an HTTP method and URL path into a [`ClassifiedRequest`]. The
//! resource-oriented layout is
//!
//! ```text
//! /<prefix>[/<group>]/<version>[/namespaces/<namespace>]/<resource>[/<name>[/<subresource>]]
//! ```
//!
//! Paths outside the configured prefixes are non-resource requests.

use crate::config::AuthzConfig;
use crate::error::ClassifyError;
use crate::model::Verb;
use crate::request::info::ClassifiedRequest;
use std::collections::HashSet;
use tracing::trace;

const NAMESPACES_SEGMENT: &str = "namespaces";

/// Classifies requests against a fixed set of API prefixes
#[derive(Debug, Clone, Default)]
pub struct RequestClassifier {
    /// Prefixes whose next segment is the API version
    prefixes: HashSet<String>,
    /// Prefixes whose next two segments are API group and version
    grouped_prefixes: HashSet<String>,
}

impl RequestClassifier {
    /// Create a classifier for groupless prefixes such as `api`
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            grouped_prefixes: HashSet::new(),
        }
    }

    /// Add prefixes such as `apis` that carry an API group before the version
    pub fn with_grouped_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prefix in prefixes {
            let prefix = prefix.into();
            self.prefixes.remove(&prefix);
            self.grouped_prefixes.insert(prefix);
        }
        self
    }

    pub fn from_config(config: &AuthzConfig) -> Self {
        Self::new(config.api_prefixes.iter().cloned())
            .with_grouped_prefixes(config.grouped_prefixes.iter().cloned())
    }

    /// Classify a request. Pure and deterministic.
    pub fn classify(&self, method: &str, path: &str) -> Result<ClassifiedRequest, ClassifyError> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments = split_segments(path)?;

        let Some((prefix, rest)) = segments.split_first() else {
            return Ok(ClassifiedRequest::non_resource(method, path));
        };

        let grouped = self.grouped_prefixes.contains(prefix);
        if !grouped && !self.prefixes.contains(prefix) {
            trace!(path, "Path outside API prefixes");
            return Ok(ClassifiedRequest::non_resource(method, path));
        }

        let mut rest = rest;
        let mut api_group = String::new();
        if grouped {
            let Some((group, tail)) = rest.split_first() else {
                return Ok(ClassifiedRequest::non_resource(method, path));
            };
            api_group = group.clone();
            rest = tail;
        }

        // A bare prefix or prefix/version is API discovery, not a resource.
        let Some((api_version, tail)) = rest.split_first() else {
            return Ok(ClassifiedRequest::non_resource(method, path));
        };
        rest = tail;
        if rest.is_empty() {
            return Ok(ClassifiedRequest::non_resource(method, path));
        }

        let mut namespace = String::new();
        if rest[0] == NAMESPACES_SEGMENT && rest.len() > 1 {
            namespace = rest[1].clone();
            // `namespaces/<ns>` alone addresses the namespace object itself.
            if rest.len() > 2 {
                rest = &rest[2..];
            }
        }

        let resource = rest[0].clone();
        let name = rest.get(1).cloned().unwrap_or_default();
        let subresource = rest.get(2).cloned().unwrap_or_default();

        let verb = resource_verb(method, !name.is_empty()).ok_or_else(|| {
            ClassifyError::UnsupportedMethod {
                method: method.to_string(),
                path: path.to_string(),
            }
        })?;

        Ok(ClassifiedRequest {
            verb,
            is_resource_request: true,
            path: path.to_string(),
            api_prefix: prefix.clone(),
            api_group,
            api_version: api_version.clone(),
            namespace,
            resource,
            subresource,
            name,
        })
    }
}

/// Split on `/` and percent-decode each segment.
///
/// A segment that decodes to a `/` is rejected: it would otherwise hide a
/// path boundary from the classifier that the backend still sees.
fn split_segments(path: &str) -> Result<Vec<String>, ClassifyError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let invalid = || ClassifyError::InvalidSegment {
                segment: segment.to_string(),
            };
            let decoded = urlencoding::decode(segment).map_err(|_| invalid())?;
            if decoded.contains('/') {
                return Err(invalid());
            }
            Ok(decoded.into_owned())
        })
        .collect()
}

/// Map an HTTP method to the verb of a resource request
fn resource_verb(method: &str, has_name: bool) -> Option<Verb> {
    let verb = match method.to_ascii_uppercase().as_str() {
        "GET" | "HEAD" if has_name => Verb::Get,
        "GET" | "HEAD" => Verb::List,
        "POST" => Verb::Create,
        "PUT" => Verb::Update,
        "PATCH" => Verb::Patch,
        "DELETE" => Verb::Delete,
        _ => return None,
    };
    Some(verb)
}
