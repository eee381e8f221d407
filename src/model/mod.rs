//! Policy model
//!
//! Resources, operations, rules, roles, groups and users. Everything here is
//! a plain value type; persistence lives in [`crate::store`].

pub mod entities;
pub mod operation;
pub mod rule;

pub use entities::{
    AUTHENTICATED_GROUP, Group, GroupKind, ROOT_GROUP, ROOT_ROLE, Resource, ResourceKind, Role,
    Scope, UNAUTHENTICATED_GROUP, User, UserId, validate_namespace,
};
pub use operation::{Operation, Verb};
pub use rule::{RULES_SCHEMA_VERSION, Rule, Rules, WILDCARD_RESOURCE};
