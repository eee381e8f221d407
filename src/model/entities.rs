//! Policy entities: resources, roles, groups and users

use crate::error::ModelError;
use crate::model::rule::{Rule, Rules};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Group every principal with full privileges belongs to
pub const ROOT_GROUP: &str = "root";
/// Implicit group of every identified user
pub const AUTHENTICATED_GROUP: &str = "system:authenticated";
/// Implicit group of every anonymous caller
pub const UNAUTHENTICATED_GROUP: &str = "system:unauthenticated";
/// Built-in role granted to members of [`ROOT_GROUP`]
pub const ROOT_ROLE: &str = "system:root";

static NAMESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

const MAX_NAMESPACE_LEN: usize = 63;

/// Check that a namespace is a lowercase DNS label
pub fn validate_namespace(namespace: &str) -> Result<(), ModelError> {
    if namespace.len() > MAX_NAMESPACE_LEN || !NAMESPACE_REGEX.is_match(namespace) {
        return Err(ModelError::InvalidNamespace {
            namespace: namespace.to_string(),
        });
    }
    Ok(())
}

fn validate_name(kind: &'static str, name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::EmptyName { kind });
    }
    Ok(())
}

/// Whether grants apply cluster-wide or inside a single namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Cluster,
    Namespace,
}

impl Scope {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scope::Cluster => "cluster",
            Scope::Namespace => "namespace",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a registered resource represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    Resource,
    Menu,
}

/// Administratively registered capability target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub kind: ResourceKind,
}

impl Resource {
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            kind: ResourceKind::Resource,
        }
    }

    pub fn menu(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Cluster,
            kind: ResourceKind::Menu,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name("resource", &self.name)
    }
}

/// Named policy bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub rules: Rules,
}

impl Role {
    pub fn cluster(name: impl Into<String>, rules: impl Into<Rules>) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Cluster,
            namespace: String::new(),
            rules: rules.into(),
        }
    }

    pub fn namespaced(
        name: impl Into<String>,
        namespace: impl Into<String>,
        rules: impl Into<Rules>,
    ) -> Self {
        Self {
            name: name.into(),
            scope: Scope::Namespace,
            namespace: namespace.into(),
            rules: rules.into(),
        }
    }

    /// The built-in all-privileges role carried by the root group
    pub fn root() -> Self {
        Self::cluster(ROOT_ROLE, vec![Rule::all()])
    }

    /// Whether this role's grants reach a request in `namespace`.
    ///
    /// An empty namespace is a cluster-level request, reachable only by
    /// cluster-scoped roles.
    pub fn applies_to(&self, namespace: &str) -> bool {
        match self.scope {
            Scope::Cluster => true,
            Scope::Namespace => !namespace.is_empty() && self.namespace == namespace,
        }
    }

    /// Validate and normalize: cluster roles never carry a namespace
    pub fn validate(mut self) -> Result<Self, ModelError> {
        validate_name("role", &self.name)?;
        match self.scope {
            Scope::Cluster => self.namespace.clear(),
            Scope::Namespace => {
                if self.namespace.is_empty() {
                    return Err(ModelError::MissingNamespace { role: self.name });
                }
                validate_namespace(&self.namespace)?;
            }
        }
        Ok(self)
    }
}

/// Whether a group is built in or administratively created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    System,
    #[default]
    Custom,
}

/// Named collection of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub kind: GroupKind,
    #[serde(default)]
    pub description: String,
}

impl Group {
    pub fn custom(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::Custom,
            description: String::new(),
        }
    }

    pub fn system(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: GroupKind::System,
            description: description.into(),
        }
    }

    /// The three groups that always exist
    pub fn system_groups() -> Vec<Group> {
        vec![
            Group::system(ROOT_GROUP, "system root group"),
            Group::system(
                AUTHENTICATED_GROUP,
                "system group contains all authenticated users",
            ),
            Group::system(
                UNAUTHENTICATED_GROUP,
                "system group contains all unauthenticated users",
            ),
        ]
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name("group", &self.name)
    }
}

/// Stable user identifier as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        validate_name("user", self.id.as_str())
    }
}
