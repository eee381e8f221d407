//! rbac-gate
//!
//! Role-based authorization for resource-oriented HTTP APIs.
//!
//! ## Features
//!
//! - **Request classification** of `/<prefix>[/<group>]/<version>/...` paths into
//!   verb, namespace, resource, subresource and name
//! - **Roles and groups** with cluster or namespace scope, plus the built-in
//!   `root`, `system:authenticated` and `system:unauthenticated` groups
//! - **Deny by default**, allow on the first matching rule, with the reason
//! - **Grant cache** invalidated on every policy write
//! - **Axum middleware** mapping outcomes to 400/401/403/503
//!
//! ## Pipeline
//!
//! ```text
//! identity → classify → (non-resource: allow) → resolve roles → decide
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [authz]
//! api_prefixes = ["api"]
//! grouped_prefixes = ["apis"]
//! store_timeout_ms = 500
//!
//! [identity]
//! mode = "token"
//! tokens = { alice = "s3cret" }
//!
//! [policy]
//! file = "~/.config/rbac-gate/policy.toml"
//! ```

pub mod access_control;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod request;
pub mod server;
pub mod store;
pub mod util;

// Re-export main types
pub use access_control::{Authorization, Authorizer, Decision, Identity};
pub use config::{AppConfig, load_config};
pub use error::{AppError, AuthzError, Result};
pub use gate::Gate;
pub use request::{ClassifiedRequest, RequestClassifier};
