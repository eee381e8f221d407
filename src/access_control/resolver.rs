//! Role resolver
//!
//! Computes the effective rule set of a principal for one target namespace:
//!
//! 1. Direct roles of the user
//! 2. Roles of every group the user belongs to (one level, no nesting)
//! 3. Roles of the implicit system group (`system:authenticated` for users,
//!    `system:unauthenticated` for anonymous callers)
//! 4. The synthetic `system:root` role for members of the `root` group
//!
//! Namespaced roles bound to another namespace are dropped last. Every store
//! call is bounded by a timeout; a slow or failing store is reported as
//! [`AuthzError::StoreUnavailable`] and never as an empty grant.

use crate::access_control::cache::GrantCache;
use crate::access_control::types::{EffectiveRules, Identity};
use crate::error::{AuthzError, AuthzResult, StoreError, StoreResult};
use crate::model::{ROOT_GROUP, Role, UNAUTHENTICATED_GROUP, UserId};
use crate::store::SharedPolicyStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Resolves principals to their effective rules
#[derive(Clone)]
pub struct RoleResolver {
    store: SharedPolicyStore,
    cache: Option<Arc<GrantCache>>,
    timeout: Duration,
}

impl RoleResolver {
    pub fn new(store: SharedPolicyStore, timeout: Duration) -> Self {
        Self {
            store,
            cache: None,
            timeout,
        }
    }

    pub fn with_cache(mut self, cache: Option<Arc<GrantCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> Option<&Arc<GrantCache>> {
        self.cache.as_ref()
    }

    /// Effective rules of `identity` for requests targeting `namespace`
    /// (empty for cluster-scoped requests)
    pub async fn effective_rules(
        &self,
        identity: &Identity,
        namespace: &str,
    ) -> AuthzResult<EffectiveRules> {
        let roles = self.principal_roles(identity).await?;
        let effective: Vec<Role> = roles
            .iter()
            .filter(|role| role.applies_to(namespace))
            .cloned()
            .collect();

        trace!(
            principal = %identity,
            namespace,
            reachable = roles.len(),
            applicable = effective.len(),
            "Resolved effective roles"
        );
        Ok(EffectiveRules::new(effective))
    }

    /// All roles reachable by a principal, before namespace filtering
    async fn principal_roles(&self, identity: &Identity) -> AuthzResult<Arc<Vec<Role>>> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.lookup(identity).await?));
        };

        if let Some(roles) = cache.get(identity) {
            return Ok(roles);
        }

        let observed = cache.generation();
        let roles = Arc::new(self.lookup(identity).await?);
        if !cache.insert(identity, Arc::clone(&roles), observed) {
            debug!(principal = %identity, "Policy changed during lookup, result not cached");
        }
        Ok(roles)
    }

    async fn lookup(&self, identity: &Identity) -> AuthzResult<Vec<Role>> {
        match identity {
            Identity::Anonymous => {
                let groups = [UNAUTHENTICATED_GROUP.to_string()];
                self.bounded("roles_for_groups", self.store.roles_for_groups(&groups))
                    .await
            }
            Identity::User(user) => self.lookup_user(identity, user).await,
        }
    }

    async fn lookup_user(&self, identity: &Identity, user: &UserId) -> AuthzResult<Vec<Role>> {
        let mut roles = self
            .bounded("roles_for_user", self.store.roles_for_user(user))
            .await?;

        let mut groups: Vec<String> = self
            .bounded("groups_for_user", self.store.groups_for_user(user))
            .await?
            .into_iter()
            .map(|group| group.name)
            .collect();

        let implicit = identity.implicit_group();
        if !groups.iter().any(|name| name == implicit) {
            groups.push(implicit.to_string());
        }

        roles.extend(
            self.bounded("roles_for_groups", self.store.roles_for_groups(&groups))
                .await?,
        );

        if groups.iter().any(|name| name == ROOT_GROUP) {
            debug!(user = %user, "User is a member of the root group");
            roles.insert(0, Role::root());
        }

        Ok(roles)
    }

    /// Run one store call under the lookup timeout
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> AuthzResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(backend = self.store.backend(), operation, error = %e, "Policy store lookup failed");
                Err(AuthzError::StoreUnavailable(e))
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(backend = self.store.backend(), operation, timeout_ms, "Policy store lookup timed out");
                Err(AuthzError::StoreUnavailable(StoreError::Timeout { timeout_ms }))
            }
        }
    }
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver")
            .field("backend", &self.store.backend())
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AUTHENTICATED_GROUP, Group, Operation, ROOT_ROLE, Rule, User};
    use crate::store::{MemoryPolicyStore, PolicyAdmin, bootstrap};

    async fn seeded_store() -> Arc<MemoryPolicyStore> {
        let store = Arc::new(MemoryPolicyStore::new());
        bootstrap(store.as_ref()).await.unwrap();
        store
            .create_groups(vec![Group::custom("team-a")])
            .await
            .unwrap();
        store.create_user(User::new("alice", "Alice")).await.unwrap();
        store.create_user(User::new("carol", "Carol")).await.unwrap();

        store
            .put_role(Role::cluster(
                "posts-viewer",
                vec![Rule::new("posts", Operation::View)],
            ))
            .await
            .unwrap();
        store
            .put_role(Role::namespaced(
                "team-a-editor",
                "team-a",
                vec![Rule::new("containers", Operation::Edit)],
            ))
            .await
            .unwrap();
        store
            .put_role(Role::cluster(
                "everyone",
                vec![Rule::new("auth", Operation::View)],
            ))
            .await
            .unwrap();

        let alice = UserId::from("alice");
        store
            .assign_role_to_user("posts-viewer", &alice)
            .await
            .unwrap();
        store
            .assign_role_to_group("team-a-editor", "team-a")
            .await
            .unwrap();
        store
            .assign_role_to_group("everyone", AUTHENTICATED_GROUP)
            .await
            .unwrap();
        store.add_user_to_group(&alice, "team-a").await.unwrap();
        store
            .add_user_to_group(&UserId::from("carol"), ROOT_GROUP)
            .await
            .unwrap();
        store
    }

    fn names(rules: &EffectiveRules) -> Vec<&str> {
        rules.roles().iter().map(|role| role.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_direct_group_and_implicit_roles() {
        let resolver = RoleResolver::new(seeded_store().await, Duration::from_secs(1));
        let rules = resolver
            .effective_rules(&Identity::user("alice"), "team-a")
            .await
            .unwrap();
        let names = names(&rules);
        assert!(names.contains(&"posts-viewer"));
        assert!(names.contains(&"team-a-editor"));
        assert!(names.contains(&"everyone"));
    }

    #[tokio::test]
    async fn test_namespaced_roles_are_filtered() {
        let resolver = RoleResolver::new(seeded_store().await, Duration::from_secs(1));
        let alice = Identity::user("alice");

        let other = resolver.effective_rules(&alice, "team-b").await.unwrap();
        assert!(!names(&other).contains(&"team-a-editor"));

        let cluster = resolver.effective_rules(&alice, "").await.unwrap();
        assert!(!names(&cluster).contains(&"team-a-editor"));
        assert!(names(&cluster).contains(&"posts-viewer"));
    }

    #[tokio::test]
    async fn test_root_member_gets_root_role() {
        let resolver = RoleResolver::new(seeded_store().await, Duration::from_secs(1));
        let rules = resolver
            .effective_rules(&Identity::user("carol"), "anything")
            .await
            .unwrap();
        assert_eq!(rules.roles()[0].name, ROOT_ROLE);
    }

    #[tokio::test]
    async fn test_anonymous_only_gets_unauthenticated_roles() {
        let store = seeded_store().await;
        store
            .put_role(Role::cluster(
                "public",
                vec![Rule::new("posts", Operation::View)],
            ))
            .await
            .unwrap();
        store
            .assign_role_to_group("public", UNAUTHENTICATED_GROUP)
            .await
            .unwrap();

        let resolver = RoleResolver::new(store, Duration::from_secs(1));
        let rules = resolver
            .effective_rules(&Identity::Anonymous, "")
            .await
            .unwrap();
        assert_eq!(names(&rules), vec!["public"]);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_authenticated_roles_only() {
        let resolver = RoleResolver::new(seeded_store().await, Duration::from_secs(1));
        let rules = resolver
            .effective_rules(&Identity::user("nobody"), "")
            .await
            .unwrap();
        assert_eq!(names(&rules), vec!["everyone"]);
    }

    #[tokio::test]
    async fn test_cached_lookup_is_reused() {
        let store = seeded_store().await;
        let cache = Arc::new(GrantCache::new(Duration::from_secs(60), 100));
        let resolver =
            RoleResolver::new(store.clone(), Duration::from_secs(1)).with_cache(Some(cache.clone()));

        let alice = Identity::user("alice");
        resolver.effective_rules(&alice, "").await.unwrap();
        assert_eq!(cache.len(), 1);

        // A write that bypasses eviction is invisible until the entry goes
        store
            .revoke_role_from_user("posts-viewer", &UserId::from("alice"))
            .await
            .unwrap();
        let stale = resolver.effective_rules(&alice, "").await.unwrap();
        assert!(names(&stale).contains(&"posts-viewer"));

        cache.invalidate_user(&UserId::from("alice"));
        let fresh = resolver.effective_rules(&alice, "").await.unwrap();
        assert!(!names(&fresh).contains(&"posts-viewer"));
    }
}
