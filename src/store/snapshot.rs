//! Policy snapshot files
//!
//! A snapshot describes resources, roles, groups, users and the edges between
//! them. It is the on-disk source for a [`crate::store::MemoryPolicyStore`].
//!
//! ```toml
//! version = 1
//!
//! [[roles]]
//! name = "team-a-editor"
//! scope = "namespace"
//! namespace = "team-a"
//! rules = [{ resource = "containers", operation = "edit" }]
//!
//! [[groups]]
//! name = "team-a"
//! roles = ["team-a-editor"]
//! members = ["alice"]
//!
//! [[users]]
//! id = "alice"
//! roles = []
//! ```

use crate::error::{StoreError, StoreResult};
use crate::model::{Group, GroupKind, Resource, Role, User, UserId};
use crate::store::PolicyAdmin;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Group entry with its edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub kind: GroupKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// User entry with its edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Serializable description of a whole policy graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            resources: Vec::new(),
            roles: Vec::new(),
            groups: Vec::new(),
            users: Vec::new(),
        }
    }
}

impl PolicySnapshot {
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let snapshot: Self = toml::from_str(s).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        snapshot.check_version()
    }

    pub fn from_json_str(s: &str) -> StoreResult<Self> {
        let snapshot: Self =
            serde_json::from_str(s).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        snapshot.check_version()
    }

    /// Read a snapshot file; `.json` files are JSON, anything else TOML
    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Snapshot(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    fn check_version(self) -> StoreResult<Self> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        Ok(self)
    }

    /// Write the snapshot into a store.
    ///
    /// Entities are created first and edges second, so edge order inside the
    /// file does not matter. Existing users are kept.
    pub async fn apply(&self, store: &dyn PolicyAdmin) -> StoreResult<()> {
        store.create_resources(self.resources.clone()).await?;

        let groups = self
            .groups
            .iter()
            .map(|entry| Group {
                name: entry.name.clone(),
                kind: entry.kind,
                description: entry.description.clone(),
            })
            .collect();
        store.create_groups(groups).await?;

        for role in &self.roles {
            store.put_role(role.clone()).await?;
        }

        for entry in &self.users {
            match store.create_user(User::new(&entry.id, &entry.name)).await {
                Ok(()) | Err(StoreError::AlreadyExists { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        for entry in &self.users {
            let id = UserId::new(&entry.id);
            for role in &entry.roles {
                store.assign_role_to_user(role, &id).await?;
            }
            for group in &entry.groups {
                store.add_user_to_group(&id, group).await?;
            }
        }

        for entry in &self.groups {
            for role in &entry.roles {
                store.assign_role_to_group(role, &entry.name).await?;
            }
            for member in &entry.members {
                store
                    .add_user_to_group(&UserId::new(member), &entry.name)
                    .await?;
            }
        }

        info!(
            resources = self.resources.len(),
            roles = self.roles.len(),
            groups = self.groups.len(),
            users = self.users.len(),
            "Applied policy snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Operation, Scope};
    use crate::store::{MemoryPolicyStore, PolicyStore};

    const SNAPSHOT: &str = r#"
version = 1

[[resources]]
name = "containers"

[[roles]]
name = "team-a-editor"
scope = "namespace"
namespace = "team-a"
rules = [{ resource = "containers", operation = "edit" }]

[[roles]]
name = "viewer"
rules = [{ resource = "*", operation = "view" }]

[[groups]]
name = "team-a"
roles = ["team-a-editor"]
members = ["alice"]

[[users]]
id = "alice"
name = "Alice"
roles = ["viewer"]
"#;

    #[test]
    fn test_parse_toml_snapshot() {
        let snapshot = PolicySnapshot::from_toml_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.roles.len(), 2);
        assert_eq!(snapshot.roles[0].scope, Scope::Namespace);
        assert_eq!(
            snapshot.roles[0].rules.iter().next().unwrap().operation,
            Operation::Edit
        );
        assert_eq!(snapshot.groups[0].members, vec!["alice"]);
    }

    #[test]
    fn test_unsupported_version() {
        let result = PolicySnapshot::from_toml_str("version = 7");
        assert!(matches!(result, Err(StoreError::Snapshot(_))));
    }

    #[test]
    fn test_parse_json_snapshot() {
        let json = r#"{"roles":[{"name":"viewer","rules":[{"resource":"*","operation":"view"}]}]}"#;
        let snapshot = PolicySnapshot::from_json_str(json).unwrap();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.roles[0].scope, Scope::Cluster);
    }

    #[tokio::test]
    async fn test_apply_snapshot() {
        let store = MemoryPolicyStore::new();
        let snapshot = PolicySnapshot::from_toml_str(SNAPSHOT).unwrap();
        snapshot.apply(&store).await.unwrap();

        let alice = UserId::from("alice");
        let direct = store.roles_for_user(&alice).await.unwrap();
        assert_eq!(direct[0].name, "viewer");

        let groups = store.groups_for_user(&alice).await.unwrap();
        assert_eq!(groups[0].name, "team-a");

        // Applying twice is harmless
        snapshot.apply(&store).await.unwrap();
        assert_eq!(store.roles_for_user(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_rejects_dangling_edge() {
        let store = MemoryPolicyStore::new();
        let snapshot = PolicySnapshot::from_toml_str(
            r#"
[[users]]
id = "bob"
roles = ["missing-role"]
"#,
        )
        .unwrap();
        let result = snapshot.apply(&store).await;
        assert!(matches!(result, Err(StoreError::NotFound { kind: "role", .. })));
    }
}
