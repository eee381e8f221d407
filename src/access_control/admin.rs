//! Cache-coherent policy administration
//!
//! Every policy write goes through [`PolicyAdministrator`], which performs the
//! write on the underlying store and then evicts the affected grant cache
//! entries before returning. Once a write is acknowledged, no later
//! authorization decision is made from the state before it.

use crate::access_control::cache::GrantCache;
use crate::error::StoreResult;
use crate::model::{Group, Resource, Role, User, UserId};
use crate::store::{PolicyAdmin, PolicyStore, SharedPolicyAdmin};
use async_trait::async_trait;
use std::sync::Arc;

/// Which cache entries a write can affect
enum Affected<'a> {
    Nothing,
    User(&'a UserId),
    Everyone,
}

/// Policy store wrapper that keeps the grant cache coherent
#[derive(Clone)]
pub struct PolicyAdministrator {
    store: SharedPolicyAdmin,
    cache: Option<Arc<GrantCache>>,
}

impl PolicyAdministrator {
    pub fn new(store: SharedPolicyAdmin, cache: Option<Arc<GrantCache>>) -> Self {
        Self { store, cache }
    }

    /// Evict regardless of the write outcome; a failed remote write may
    /// still have been applied.
    fn evict(&self, affected: Affected<'_>) {
        let Some(cache) = &self.cache else {
            return;
        };
        match affected {
            Affected::Nothing => {}
            Affected::User(user) => cache.invalidate_user(user),
            Affected::Everyone => cache.invalidate_all(),
        }
    }

    fn finish<T>(&self, result: StoreResult<T>, affected: Affected<'_>) -> StoreResult<T> {
        self.evict(affected);
        result
    }
}

#[async_trait]
impl PolicyStore for PolicyAdministrator {
    async fn load_role(&self, name: &str) -> StoreResult<Role> {
        self.store.load_role(name).await
    }

    async fn load_resource(&self, name: &str) -> StoreResult<Resource> {
        self.store.load_resource(name).await
    }

    async fn roles_for_user(&self, user: &UserId) -> StoreResult<Vec<Role>> {
        self.store.roles_for_user(user).await
    }

    async fn roles_for_groups(&self, groups: &[String]) -> StoreResult<Vec<Role>> {
        self.store.roles_for_groups(groups).await
    }

    async fn groups_for_user(&self, user: &UserId) -> StoreResult<Vec<Group>> {
        self.store.groups_for_user(user).await
    }

    fn backend(&self) -> &'static str {
        self.store.backend()
    }
}

#[async_trait]
impl PolicyAdmin for PolicyAdministrator {
    // Resources and fresh groups carry no grants
    async fn create_resources(&self, resources: Vec<Resource>) -> StoreResult<usize> {
        let result = self.store.create_resources(resources).await;
        self.finish(result, Affected::Nothing)
    }

    async fn create_groups(&self, groups: Vec<Group>) -> StoreResult<usize> {
        let result = self.store.create_groups(groups).await;
        self.finish(result, Affected::Nothing)
    }

    async fn delete_group(&self, name: &str) -> StoreResult<()> {
        let result = self.store.delete_group(name).await;
        self.finish(result, Affected::Everyone)
    }

    async fn create_user(&self, user: User) -> StoreResult<()> {
        let id = user.id.clone();
        let result = self.store.create_user(user).await;
        self.finish(result, Affected::User(&id))
    }

    async fn delete_user(&self, user: &UserId) -> StoreResult<()> {
        let result = self.store.delete_user(user).await;
        self.finish(result, Affected::User(user))
    }

    async fn put_role(&self, role: Role) -> StoreResult<()> {
        let result = self.store.put_role(role).await;
        self.finish(result, Affected::Everyone)
    }

    async fn delete_role(&self, name: &str) -> StoreResult<()> {
        let result = self.store.delete_role(name).await;
        self.finish(result, Affected::Everyone)
    }

    async fn assign_role_to_user(&self, role: &str, user: &UserId) -> StoreResult<()> {
        let result = self.store.assign_role_to_user(role, user).await;
        self.finish(result, Affected::User(user))
    }

    async fn revoke_role_from_user(&self, role: &str, user: &UserId) -> StoreResult<()> {
        let result = self.store.revoke_role_from_user(role, user).await;
        self.finish(result, Affected::User(user))
    }

    async fn assign_role_to_group(&self, role: &str, group: &str) -> StoreResult<()> {
        let result = self.store.assign_role_to_group(role, group).await;
        self.finish(result, Affected::Everyone)
    }

    async fn revoke_role_from_group(&self, role: &str, group: &str) -> StoreResult<()> {
        let result = self.store.revoke_role_from_group(role, group).await;
        self.finish(result, Affected::Everyone)
    }

    async fn add_user_to_group(&self, user: &UserId, group: &str) -> StoreResult<()> {
        let result = self.store.add_user_to_group(user, group).await;
        self.finish(result, Affected::User(user))
    }

    async fn remove_user_from_group(&self, user: &UserId, group: &str) -> StoreResult<()> {
        let result = self.store.remove_user_from_group(user, group).await;
        self.finish(result, Affected::User(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::types::Identity;
    use crate::model::Rule;
    use crate::store::MemoryPolicyStore;
    use std::time::Duration;

    fn fixture() -> (PolicyAdministrator, Arc<GrantCache>) {
        let cache = Arc::new(GrantCache::new(Duration::from_secs(60), 100));
        let admin = PolicyAdministrator::new(
            Arc::new(MemoryPolicyStore::new()),
            Some(Arc::clone(&cache)),
        );
        (admin, cache)
    }

    fn warm(cache: &GrantCache, identity: &Identity) {
        cache.insert(identity, Arc::new(Vec::new()), cache.generation());
    }

    #[tokio::test]
    async fn test_user_edge_write_evicts_only_that_user() {
        let (admin, cache) = fixture();
        admin.create_user(User::new("alice", "")).await.unwrap();
        admin.put_role(Role::cluster("r", vec![Rule::all()])).await.unwrap();

        let alice = Identity::user("alice");
        let bob = Identity::user("bob");
        warm(&cache, &alice);
        warm(&cache, &bob);

        admin
            .assign_role_to_user("r", &UserId::from("alice"))
            .await
            .unwrap();
        assert!(cache.get(&alice).is_none());
        assert!(cache.get(&bob).is_some());
    }

    #[tokio::test]
    async fn test_role_write_evicts_everyone() {
        let (admin, cache) = fixture();
        warm(&cache, &Identity::user("alice"));
        warm(&cache, &Identity::Anonymous);

        admin.put_role(Role::cluster("r", vec![Rule::all()])).await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_still_evicts() {
        let (admin, cache) = fixture();
        let alice = Identity::user("alice");
        warm(&cache, &alice);

        let result = admin
            .assign_role_to_user("missing", &UserId::from("alice"))
            .await;
        assert!(result.is_err());
        assert!(cache.get(&alice).is_none());
    }

    #[tokio::test]
    async fn test_resource_write_keeps_cache() {
        let (admin, cache) = fixture();
        let alice = Identity::user("alice");
        warm(&cache, &alice);

        admin
            .create_resources(vec![Resource::menu("dashboard")])
            .await
            .unwrap();
        assert!(cache.get(&alice).is_some());
    }

    #[tokio::test]
    async fn test_reads_pass_through() {
        let admin = PolicyAdministrator::new(Arc::new(MemoryPolicyStore::new()), None);
        admin.put_role(Role::cluster("r", vec![Rule::all()])).await.unwrap();
        assert_eq!(admin.load_role("r").await.unwrap().name, "r");
        assert_eq!(admin.backend(), "memory");
    }
}
