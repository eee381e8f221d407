//! Bootstrap seeding
//!
//! Runs a fixed, explicit sequence of idempotent steps against a store:
//! seed resources, then system groups. Running it twice creates nothing new.

use crate::error::StoreResult;
use crate::model::{Group, Resource, Scope};
use crate::store::PolicyAdmin;
use tracing::info;

pub const CONTAINER_RESOURCE: &str = "containers";
pub const POST_RESOURCE: &str = "posts";
pub const USER_RESOURCE: &str = "users";
pub const GROUP_RESOURCE: &str = "groups";
pub const ROLE_RESOURCE: &str = "roles";
pub const AUTH_RESOURCE: &str = "auth";
pub const NAMESPACE_RESOURCE: &str = "namespaces";

/// Resources every deployment starts with
pub fn seed_resources() -> Vec<Resource> {
    let containers = [
        CONTAINER_RESOURCE.to_string(),
        format!("{CONTAINER_RESOURCE}/log"),
        format!("{CONTAINER_RESOURCE}/exec"),
        format!("{CONTAINER_RESOURCE}/proxy"),
    ];
    containers
        .into_iter()
        .chain(
            [
                POST_RESOURCE,
                GROUP_RESOURCE,
                USER_RESOURCE,
                ROLE_RESOURCE,
                AUTH_RESOURCE,
                NAMESPACE_RESOURCE,
            ]
            .map(String::from),
        )
        .map(|name| Resource::new(name, Scope::Cluster))
        .collect()
}

/// What a bootstrap run created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub resources_created: usize,
    pub groups_created: usize,
}

/// Seed resources and system groups, skipping anything that exists
pub async fn bootstrap(store: &dyn PolicyAdmin) -> StoreResult<BootstrapReport> {
    let resources_created = store.create_resources(seed_resources()).await?;
    let groups_created = store.create_groups(Group::system_groups()).await?;

    info!(
        backend = store.backend(),
        resources_created, groups_created, "Policy store bootstrapped"
    );

    Ok(BootstrapReport {
        resources_created,
        groups_created,
    })
}
