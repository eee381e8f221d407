//! Grant cache coherence tests
//!
//! Policy writes made through the administrator must be visible to the very
//! next authorization, including when a lookup was in flight during the
//! write.

use async_trait::async_trait;
use rbac_gate::access_control::{GrantCache, PolicyAdministrator, RoleResolver};
use rbac_gate::error::StoreResult;
use rbac_gate::model::{Group, Operation, Resource, Role, Rule, User, UserId};
use rbac_gate::store::{MemoryPolicyStore, PolicyAdmin, PolicyStore};
use rbac_gate::{Gate, Identity, config::AuthzConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

// =============================================================================
// Test Doubles
// =============================================================================

/// Read-through store that counts lookups and can park one lookup after it
/// has read, so a write can land between the read and the cache insert.
struct GatedStore {
    inner: Arc<MemoryPolicyStore>,
    lookups: AtomicUsize,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedStore {
    fn new(inner: Arc<MemoryPolicyStore>) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl PolicyStore for GatedStore {
    async fn load_role(&self, name: &str) -> StoreResult<Role> {
        self.inner.load_role(name).await
    }

    async fn load_resource(&self, name: &str) -> StoreResult<Resource> {
        self.inner.load_resource(name).await
    }

    async fn roles_for_user(&self, user: &UserId) -> StoreResult<Vec<Role>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let roles = self.inner.roles_for_user(user).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(roles)
    }

    async fn roles_for_groups(&self, groups: &[String]) -> StoreResult<Vec<Role>> {
        self.inner.roles_for_groups(groups).await
    }

    async fn groups_for_user(&self, user: &UserId) -> StoreResult<Vec<Group>> {
        self.inner.groups_for_user(user).await
    }

    fn backend(&self) -> &'static str {
        "gated"
    }
}

struct Fixture {
    store: Arc<GatedStore>,
    cache: Arc<GrantCache>,
    admin: PolicyAdministrator,
    resolver: RoleResolver,
}

async fn fixture() -> Fixture {
    let inner = Arc::new(MemoryPolicyStore::new());
    let cache = Arc::new(GrantCache::new(Duration::from_secs(300), 1000));
    let admin = PolicyAdministrator::new(inner.clone(), Some(cache.clone()));

    admin.create_user(User::new("alice", "Alice")).await.unwrap();
    admin
        .put_role(Role::cluster(
            "posts-editor",
            vec![Rule::new("posts", Operation::Edit)],
        ))
        .await
        .unwrap();
    admin
        .assign_role_to_user("posts-editor", &UserId::from("alice"))
        .await
        .unwrap();

    let store = Arc::new(GatedStore::new(inner));
    let resolver =
        RoleResolver::new(store.clone(), Duration::from_secs(5)).with_cache(Some(cache.clone()));

    Fixture {
        store,
        cache,
        admin,
        resolver,
    }
}

fn has_role(rules: &rbac_gate::access_control::EffectiveRules, name: &str) -> bool {
    rules.roles().iter().any(|role| role.name == name)
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_repeated_lookups_hit_cache() {
    let f = fixture().await;
    let alice = Identity::user("alice");

    for _ in 0..5 {
        f.resolver.effective_rules(&alice, "").await.unwrap();
    }
    assert_eq!(f.store.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_revocation_visible_immediately() {
    let f = fixture().await;
    let alice = Identity::user("alice");

    let before = f.resolver.effective_rules(&alice, "").await.unwrap();
    assert!(has_role(&before, "posts-editor"));

    f.admin
        .revoke_role_from_user("posts-editor", &UserId::from("alice"))
        .await
        .unwrap();

    let after = f.resolver.effective_rules(&alice, "").await.unwrap();
    assert!(!has_role(&after, "posts-editor"));
}

#[tokio::test]
async fn test_role_edit_visible_immediately() {
    let f = fixture().await;
    let alice = Identity::user("alice");
    f.resolver.effective_rules(&alice, "").await.unwrap();

    f.admin
        .put_role(Role::cluster(
            "posts-editor",
            vec![Rule::new("posts", Operation::View)],
        ))
        .await
        .unwrap();

    let rules = f.resolver.effective_rules(&alice, "").await.unwrap();
    let role = rules
        .roles()
        .iter()
        .find(|role| role.name == "posts-editor")
        .unwrap();
    assert_eq!(role.rules.iter().next().unwrap().operation, Operation::View);
}

#[tokio::test]
async fn test_group_membership_visible_immediately() {
    let f = fixture().await;
    let alice = Identity::user("alice");

    f.admin
        .create_groups(vec![Group::custom("ops")])
        .await
        .unwrap();
    f.admin
        .put_role(Role::cluster("ops", vec![Rule::new("containers", Operation::All)]))
        .await
        .unwrap();
    f.admin.assign_role_to_group("ops", "ops").await.unwrap();

    assert!(!has_role(&f.resolver.effective_rules(&alice, "").await.unwrap(), "ops"));

    f.admin
        .add_user_to_group(&UserId::from("alice"), "ops")
        .await
        .unwrap();
    assert!(has_role(&f.resolver.effective_rules(&alice, "").await.unwrap(), "ops"));
}

#[tokio::test]
async fn test_in_flight_lookup_cannot_repopulate_stale_entry() {
    let f = fixture().await;
    let alice = Identity::user("alice");

    f.store.armed.store(true, Ordering::SeqCst);
    let resolver = f.resolver.clone();
    let lookup = {
        let alice = alice.clone();
        tokio::spawn(async move { resolver.effective_rules(&alice, "").await })
    };

    // The lookup has read the old grants and is parked before caching them
    f.store.entered.notified().await;
    f.admin
        .revoke_role_from_user("posts-editor", &UserId::from("alice"))
        .await
        .unwrap();
    f.store.release.notify_one();

    // The in-flight request raced the write and may still see the old grant
    let in_flight = lookup.await.unwrap().unwrap();
    assert!(has_role(&in_flight, "posts-editor"));

    // ...but it must not have been cached
    assert!(f.cache.get(&alice).is_none());
    let next = f.resolver.effective_rules(&alice, "").await.unwrap();
    assert!(!has_role(&next, "posts-editor"));
}

#[tokio::test]
async fn test_expired_entries_are_reloaded() {
    let inner = Arc::new(MemoryPolicyStore::new());
    let store = Arc::new(GatedStore::new(inner));
    let cache = Arc::new(GrantCache::new(Duration::from_millis(20), 100));
    let resolver = RoleResolver::new(store.clone(), Duration::from_secs(1)).with_cache(Some(cache));

    let alice = Identity::user("alice");
    resolver.effective_rules(&alice, "").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    resolver.effective_rules(&alice, "").await.unwrap();

    assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_gate_write_path_evicts() {
    let store = Arc::new(MemoryPolicyStore::new());
    let gate = Gate::with_store(&AuthzConfig::default(), store);
    let alice = Identity::user("alice");

    gate.admin.create_user(User::new("alice", "")).await.unwrap();
    gate.admin
        .put_role(Role::cluster("posts", vec![Rule::new("posts", Operation::View)]))
        .await
        .unwrap();

    let denied = gate
        .authorizer
        .authorize("GET", "/api/v1/posts", &alice)
        .await
        .unwrap();
    assert!(!denied.is_allowed());

    gate.admin
        .assign_role_to_user("posts", &UserId::from("alice"))
        .await
        .unwrap();

    let granted = gate
        .authorizer
        .authorize("GET", "/api/v1/posts", &alice)
        .await
        .unwrap();
    assert!(granted.is_allowed());
}
