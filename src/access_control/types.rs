//! Access control types
//!
//! Core types used by the access control system.

use crate::model::{AUTHENTICATED_GROUP, Role, Rule, UNAUTHENTICATED_GROUP, UserId};
use serde::Serialize;
use std::fmt;

/// Reason recorded when no rule grants a request
pub const NO_MATCHING_RULE: &str = "no matching rule";

/// Reason recorded for requests outside every API prefix
pub const NON_RESOURCE_REQUEST: &str = "non-resource request";

/// Who is asking, as established by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "user", rename_all = "snake_case")]
pub enum Identity {
    /// A successfully identified user
    User(UserId),
    /// No credentials were presented
    Anonymous,
}

impl Identity {
    pub fn user(id: impl Into<String>) -> Self {
        Identity::User(UserId::new(id))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Anonymous => None,
        }
    }

    /// The system group this identity belongs to without any stored edge
    pub fn implicit_group(&self) -> &'static str {
        match self {
            Identity::User(_) => AUTHENTICATED_GROUP,
            Identity::Anonymous => UNAUTHENTICATED_GROUP,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::User(id) => write!(f, "user:{}", id),
            Identity::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Roles reachable by a principal for one target namespace, each carrying
/// its rules. Overlapping rules are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveRules {
    roles: Vec<Role>,
}

impl EffectiveRules {
    pub fn new(roles: Vec<Role>) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn push(&mut self, role: Role) {
        self.roles.push(role);
    }

    pub fn is_empty(&self) -> bool {
        self.roles.iter().all(|role| role.rules.is_empty())
    }

    /// Every (role, rule) pair in evaluation order
    pub fn grants(&self) -> impl Iterator<Item = (&Role, &Rule)> {
        self.roles
            .iter()
            .flat_map(|role| role.rules.iter().map(move |rule| (role, rule)))
    }

    pub fn rule_count(&self) -> usize {
        self.roles.iter().map(|role| role.rules.len()).sum()
    }
}

/// Role and rule that produced an allow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedGrant {
    pub role: String,
    pub rule: Rule,
}

/// Outcome of evaluating one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchedGrant>,
}

impl Decision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
            matched: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            matched: None,
        }
    }

    pub fn granted_by(role: &Role, rule: &Rule) -> Self {
        Self {
            allowed: true,
            reason: format!("allowed by role '{}' rule '{}'", role.name, rule),
            matched: Some(MatchedGrant {
                role: role.name.clone(),
                rule: rule.clone(),
            }),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}
