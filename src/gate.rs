//! Component wiring
//!
//! Builds the store, grant cache, resolver and authorizer from configuration
//! so the binary and the tests assemble them the same way.

use crate::access_control::{Authorizer, GrantCache, PolicyAdministrator, RoleResolver};
use crate::config::{AppConfig, AuthzConfig};
use crate::error::Result;
use crate::request::RequestClassifier;
use crate::store::{MemoryPolicyStore, PolicyAdmin, PolicySnapshot, bootstrap};
use std::sync::Arc;
use tracing::info;

/// The assembled authorization core
#[derive(Clone)]
pub struct Gate {
    pub authorizer: Arc<Authorizer>,
    /// Write path; keeps the grant cache coherent
    pub admin: PolicyAdministrator,
    pub cache: Option<Arc<GrantCache>>,
}

impl Gate {
    /// Wire the core around an existing store
    pub fn with_store<S>(config: &AuthzConfig, store: Arc<S>) -> Self
    where
        S: PolicyAdmin + 'static,
    {
        let cache = GrantCache::from_config(&config.cache);
        let admin = PolicyAdministrator::new(store.clone(), cache.clone());
        let resolver = RoleResolver::new(store, config.store_timeout()).with_cache(cache.clone());
        let authorizer = Authorizer::new(RequestClassifier::from_config(config), resolver);

        Self {
            authorizer: Arc::new(authorizer),
            admin,
            cache,
        }
    }

    /// Build an in-memory store, seed it and load the configured snapshot
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let gate = Self::with_store(&config.authz, Arc::new(MemoryPolicyStore::new()));

        if config.policy.bootstrap {
            bootstrap(&gate.admin).await?;
        }

        if let Some(file) = &config.policy.file {
            let path = shellexpand::tilde(file).into_owned();
            let snapshot = PolicySnapshot::from_path(&path)?;
            snapshot.apply(&gate.admin).await?;
            info!(file = %path, "Loaded policy snapshot");
        }

        Ok(gate)
    }
}
