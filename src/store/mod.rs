//! Policy store
//!
//! The authorization core consumes the policy graph through [`PolicyStore`]
//! and never assumes it is held in process: every lookup may be a remote
//! round-trip that times out or fails. Administrative writes go through
//! [`PolicyAdmin`].

pub mod bootstrap;
pub mod memory;
pub mod snapshot;

pub use bootstrap::{BootstrapReport, bootstrap, seed_resources};
pub use memory::MemoryPolicyStore;
pub use snapshot::PolicySnapshot;

use crate::error::StoreResult;
use crate::model::{Group, Resource, Role, User, UserId};
// async_trait required for dyn-compatibility with Arc<dyn PolicyStore>
use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the policy graph
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Load a single role by name
    async fn load_role(&self, name: &str) -> StoreResult<Role>;

    /// Load a single registered resource by name
    async fn load_resource(&self, name: &str) -> StoreResult<Resource>;

    /// Roles assigned directly to a user. Unknown users have none.
    async fn roles_for_user(&self, user: &UserId) -> StoreResult<Vec<Role>>;

    /// Roles attached to the given groups, in group order. Unknown groups
    /// contribute nothing.
    async fn roles_for_groups(&self, groups: &[String]) -> StoreResult<Vec<Role>>;

    /// Groups the user is an explicit member of
    async fn groups_for_user(&self, user: &UserId) -> StoreResult<Vec<Group>>;

    /// Short backend description (for logging)
    fn backend(&self) -> &'static str;
}

/// Write side of the policy graph
///
/// Membership edges are only removed explicitly or together with their
/// endpoint.
#[async_trait]
pub trait PolicyAdmin: PolicyStore {
    /// Register resources, skipping names that already exist. Returns the
    /// number created.
    async fn create_resources(&self, resources: Vec<Resource>) -> StoreResult<usize>;

    /// Create groups, skipping names that already exist. Returns the number
    /// created.
    async fn create_groups(&self, groups: Vec<Group>) -> StoreResult<usize>;

    async fn delete_group(&self, name: &str) -> StoreResult<()>;

    async fn create_user(&self, user: User) -> StoreResult<()>;

    async fn delete_user(&self, user: &UserId) -> StoreResult<()>;

    /// Create a role or replace the scope and rules of an existing one
    async fn put_role(&self, role: Role) -> StoreResult<()>;

    /// Delete a role together with every assignment of it
    async fn delete_role(&self, name: &str) -> StoreResult<()>;

    async fn assign_role_to_user(&self, role: &str, user: &UserId) -> StoreResult<()>;

    async fn revoke_role_from_user(&self, role: &str, user: &UserId) -> StoreResult<()>;

    async fn assign_role_to_group(&self, role: &str, group: &str) -> StoreResult<()>;

    async fn revoke_role_from_group(&self, role: &str, group: &str) -> StoreResult<()>;

    async fn add_user_to_group(&self, user: &UserId, group: &str) -> StoreResult<()>;

    async fn remove_user_from_group(&self, user: &UserId, group: &str) -> StoreResult<()>;
}

/// Shared handle to a read-only store
pub type SharedPolicyStore = Arc<dyn PolicyStore>;

/// Shared handle to a writable store
pub type SharedPolicyAdmin = Arc<dyn PolicyAdmin>;
