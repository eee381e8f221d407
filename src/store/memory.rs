//! In-process policy store
//!
//! Holds the whole policy graph behind a single lock. Ordered maps keep
//! lookups deterministic, which the decision engine relies on for stable
//! explanations. Role rules are kept in their persisted form, the versioned
//! blob of [`Rules::encode`], and decoded on every read.

use crate::error::{ModelError, StoreError, StoreResult};
use crate::model::{Group, GroupKind, Resource, Role, Rules, Scope, User, UserId};
use crate::store::{PolicyAdmin, PolicyStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug)]
struct GroupNode {
    group: Group,
    roles: BTreeSet<String>,
    members: BTreeSet<UserId>,
}

#[derive(Debug)]
struct UserNode {
    roles: BTreeSet<String>,
    groups: BTreeSet<String>,
}

/// A role as persisted
#[derive(Debug)]
struct RoleRow {
    scope: Scope,
    namespace: String,
    rules: String,
}

impl RoleRow {
    fn encode(role: &Role) -> StoreResult<Self> {
        Ok(Self {
            scope: role.scope,
            namespace: role.namespace.clone(),
            rules: role.rules.encode()?,
        })
    }

    fn decode(&self, name: &str) -> StoreResult<Role> {
        Ok(Role {
            name: name.to_string(),
            scope: self.scope,
            namespace: self.namespace.clone(),
            rules: Rules::decode(self.rules.as_bytes())?,
        })
    }
}

#[derive(Debug, Default)]
struct PolicyGraph {
    resources: BTreeMap<String, Resource>,
    roles: BTreeMap<String, RoleRow>,
    groups: BTreeMap<String, GroupNode>,
    users: BTreeMap<UserId, UserNode>,
}

impl PolicyGraph {
    fn user_mut(&mut self, user: &UserId) -> StoreResult<&mut UserNode> {
        self.users
            .get_mut(user)
            .ok_or_else(|| StoreError::not_found("user", user.as_str()))
    }

    fn group_mut(&mut self, group: &str) -> StoreResult<&mut GroupNode> {
        self.groups
            .get_mut(group)
            .ok_or_else(|| StoreError::not_found("group", group))
    }

    fn require_role(&self, role: &str) -> StoreResult<()> {
        if self.roles.contains_key(role) {
            Ok(())
        } else {
            Err(StoreError::not_found("role", role))
        }
    }

    fn resolve_roles<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> StoreResult<Vec<Role>> {
        names
            .into_iter()
            .filter_map(|name| self.roles.get(name).map(|row| row.decode(name)))
            .collect()
    }
}

/// Policy store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    graph: RwLock<PolicyGraph>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, PolicyGraph>> {
        self.graph
            .read()
            .map_err(|_| StoreError::Unavailable("policy graph lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, PolicyGraph>> {
        self.graph
            .write()
            .map_err(|_| StoreError::Unavailable("policy graph lock poisoned".into()))
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load_role(&self, name: &str) -> StoreResult<Role> {
        self.read()?
            .roles
            .get(name)
            .ok_or_else(|| StoreError::not_found("role", name))?
            .decode(name)
    }

    async fn load_resource(&self, name: &str) -> StoreResult<Resource> {
        self.read()?
            .resources
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("resource", name))
    }

    async fn roles_for_user(&self, user: &UserId) -> StoreResult<Vec<Role>> {
        let graph = self.read()?;
        match graph.users.get(user) {
            Some(node) => graph.resolve_roles(&node.roles),
            None => Ok(Vec::new()),
        }
    }

    async fn roles_for_groups(&self, groups: &[String]) -> StoreResult<Vec<Role>> {
        let graph = self.read()?;
        let mut roles = Vec::new();
        for node in groups.iter().filter_map(|name| graph.groups.get(name)) {
            roles.extend(graph.resolve_roles(&node.roles)?);
        }
        Ok(roles)
    }

    async fn groups_for_user(&self, user: &UserId) -> StoreResult<Vec<Group>> {
        let graph = self.read()?;
        Ok(graph
            .users
            .get(user)
            .map(|node| {
                node.groups
                    .iter()
                    .filter_map(|name| graph.groups.get(name))
                    .map(|g| g.group.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl PolicyAdmin for MemoryPolicyStore {
    async fn create_resources(&self, resources: Vec<Resource>) -> StoreResult<usize> {
        for resource in &resources {
            resource.validate()?;
        }
        let mut graph = self.write()?;
        let mut created = 0;
        for resource in resources {
            if !graph.resources.contains_key(&resource.name) {
                graph.resources.insert(resource.name.clone(), resource);
                created += 1;
            }
        }
        debug!(created, "Created resources");
        Ok(created)
    }

    async fn create_groups(&self, groups: Vec<Group>) -> StoreResult<usize> {
        for group in &groups {
            group.validate()?;
        }
        let mut graph = self.write()?;
        let mut created = 0;
        for group in groups {
            if !graph.groups.contains_key(&group.name) {
                graph.groups.insert(
                    group.name.clone(),
                    GroupNode {
                        group,
                        roles: BTreeSet::new(),
                        members: BTreeSet::new(),
                    },
                );
                created += 1;
            }
        }
        debug!(created, "Created groups");
        Ok(created)
    }

    async fn delete_group(&self, name: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        let node = graph
            .groups
            .get(name)
            .ok_or_else(|| StoreError::not_found("group", name))?;
        if node.group.kind == GroupKind::System {
            return Err(ModelError::SystemGroup {
                name: name.to_string(),
            }
            .into());
        }
        if let Some(node) = graph.groups.remove(name) {
            for member in &node.members {
                if let Some(user) = graph.users.get_mut(member) {
                    user.groups.remove(name);
                }
            }
        }
        Ok(())
    }

    async fn create_user(&self, user: User) -> StoreResult<()> {
        user.validate()?;
        let mut graph = self.write()?;
        if graph.users.contains_key(&user.id) {
            return Err(StoreError::already_exists("user", user.id.as_str()));
        }
        graph.users.insert(
            user.id,
            UserNode {
                roles: BTreeSet::new(),
                groups: BTreeSet::new(),
            },
        );
        Ok(())
    }

    async fn delete_user(&self, user: &UserId) -> StoreResult<()> {
        let mut graph = self.write()?;
        let node = graph
            .users
            .remove(user)
            .ok_or_else(|| StoreError::not_found("user", user.as_str()))?;
        for group in &node.groups {
            if let Some(group) = graph.groups.get_mut(group) {
                group.members.remove(user);
            }
        }
        Ok(())
    }

    async fn put_role(&self, role: Role) -> StoreResult<()> {
        let role = role.validate()?;
        let row = RoleRow::encode(&role)?;
        let mut graph = self.write()?;
        graph.roles.insert(role.name, row);
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph
            .roles
            .remove(name)
            .ok_or_else(|| StoreError::not_found("role", name))?;
        for user in graph.users.values_mut() {
            user.roles.remove(name);
        }
        for group in graph.groups.values_mut() {
            group.roles.remove(name);
        }
        Ok(())
    }

    async fn assign_role_to_user(&self, role: &str, user: &UserId) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph.require_role(role)?;
        graph.user_mut(user)?.roles.insert(role.to_string());
        Ok(())
    }

    async fn revoke_role_from_user(&self, role: &str, user: &UserId) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph.user_mut(user)?.roles.remove(role);
        Ok(())
    }

    async fn assign_role_to_group(&self, role: &str, group: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph.require_role(role)?;
        graph.group_mut(group)?.roles.insert(role.to_string());
        Ok(())
    }

    async fn revoke_role_from_group(&self, role: &str, group: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph.group_mut(group)?.roles.remove(role);
        Ok(())
    }

    async fn add_user_to_group(&self, user: &UserId, group: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        // Both ends must exist before either side is touched.
        graph.user_mut(user)?;
        graph.group_mut(group)?.members.insert(user.clone());
        graph.user_mut(user)?.groups.insert(group.to_string());
        Ok(())
    }

    async fn remove_user_from_group(&self, user: &UserId, group: &str) -> StoreResult<()> {
        let mut graph = self.write()?;
        graph.user_mut(user)?.groups.remove(group);
        graph.group_mut(group)?.members.remove(user);
        Ok(())
    }
}
