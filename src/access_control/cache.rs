//! Grant cache
//!
//! Caches the unfiltered role list of each principal so repeated requests do
//! not hit the policy store. Entries expire after a TTL and are evicted by
//! [`crate::access_control::PolicyAdministrator`] on every policy write.
//!
//! A lookup that started before an eviction must not put its (possibly stale)
//! result back into the cache. Every eviction bumps a generation counter; a
//! lookup records the generation before reading the store and its insert is
//! dropped if the generation moved in between.

use crate::access_control::types::Identity;
use crate::config::CacheConfig;
use crate::model::{Role, UserId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Number of entries dropped at once when the cache is full
const EVICTION_BATCH_SIZE: usize = 64;

struct CacheEntry {
    roles: Arc<Vec<Role>>,
    inserted_at: Instant,
}

/// Generation observed by a lookup before it read the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Per-principal role cache with invalidate-on-write semantics
pub struct GrantCache {
    entries: DashMap<Identity, CacheEntry>,
    generation: AtomicU64,
    ttl: Duration,
    max_entries: usize,
}

impl GrantCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Build from configuration, or `None` when caching is disabled
    pub fn from_config(config: &CacheConfig) -> Option<Arc<Self>> {
        config
            .enabled
            .then(|| Arc::new(Self::new(config.ttl(), config.max_entries)))
    }

    /// Fresh cached roles for a principal
    pub fn get(&self, identity: &Identity) -> Option<Arc<Vec<Role>>> {
        let hit = self.entries.get(identity).and_then(|entry| {
            (entry.inserted_at.elapsed() < self.ttl).then(|| Arc::clone(&entry.roles))
        });
        if hit.is_none() {
            self.entries
                .remove_if(identity, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        }
        trace!(principal = %identity, hit = hit.is_some(), "Grant cache lookup");
        hit
    }

    /// Current generation; take this before reading the store
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Store a lookup result unless an eviction happened since `observed`.
    ///
    /// Returns whether the entry was stored.
    pub fn insert(&self, identity: &Identity, roles: Arc<Vec<Role>>, observed: Generation) -> bool {
        self.evict_if_needed();

        // The generation is compared while the shard lock is held, so an
        // eviction either fails this check or removes the entry afterwards.
        match self.entries.entry(identity.clone()) {
            Entry::Occupied(mut occupied) => {
                if self.generation() != observed {
                    return false;
                }
                occupied.insert(CacheEntry {
                    roles,
                    inserted_at: Instant::now(),
                });
            }
            Entry::Vacant(vacant) => {
                if self.generation() != observed {
                    return false;
                }
                vacant.insert(CacheEntry {
                    roles,
                    inserted_at: Instant::now(),
                });
            }
        }
        true
    }

    /// Drop the entry of one user
    pub fn invalidate_user(&self, user: &UserId) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.remove(&Identity::User(user.clone()));
        debug!(user = %user, "Grant cache entry invalidated");
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
        debug!("Grant cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_if_needed(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }

        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);

        let current_len = self.entries.len();
        if current_len < self.max_entries {
            return;
        }

        let target_size = self.max_entries.saturating_sub(EVICTION_BATCH_SIZE);
        let to_evict = current_len.saturating_sub(target_size).max(1);

        let mut oldest: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.inserted_at))
            .collect();
        oldest.sort_by_key(|(_, inserted_at)| *inserted_at);

        for (key, _) in oldest.into_iter().take(to_evict) {
            self.entries.remove(&key);
        }
        debug!(evicted = to_evict, "Grant cache full, evicted oldest entries");
    }
}

impl std::fmt::Debug for GrantCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantCache")
            .field("entries", &self.entries.len())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}
