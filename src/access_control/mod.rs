//! Access control module
//!
//! Role-based authorization for classified HTTP requests.
//!
//! ## Access Control Model
//!
//! A principal's grants are the union of:
//!
//! 1. **Direct roles** bound to the user
//! 2. **Group roles** of every group the user is a member of
//! 3. **Implicit group roles** of `system:authenticated` (any identified user)
//!    or `system:unauthenticated` (anonymous callers)
//! 4. **`system:root`**, an all-privileges role, for members of `root`
//!
//! Namespaced roles only reach requests in their own namespace. A request is
//! allowed when any reachable rule matches its resource and verb; otherwise it
//! is denied with the reason `no matching rule`.
//!
//! ## Example Policy
//!
//! ```toml
//! [[roles]]
//! name = "team-a-editor"
//! scope = "namespace"
//! namespace = "team-a"
//! rules = [
//!     { resource = "containers", operation = "edit" },
//!     { resource = "containers/log", operation = "view" },
//! ]
//! ```

pub mod admin;
pub mod authorizer;
pub mod cache;
pub mod engine;
pub mod resolver;
pub mod types;

pub use admin::PolicyAdministrator;
pub use authorizer::{Authorization, Authorizer};
pub use cache::GrantCache;
pub use resolver::RoleResolver;
pub use types::{Decision, EffectiveRules, Identity, MatchedGrant, NO_MATCHING_RULE};
