//! Namespaced in-memory TTL cache.
//!
//! Each namespace is an isolated table with its own expiry and capacity.
//! Expiry is lazy (checked on `get`), eviction is insertion-ordered: a full
//! namespace drops its oldest-inserted entry before accepting a new key.
//!
//! Values are stored type-erased so one store can serve resolved streams,
//! page URLs and search results alike. Callers replace values wholesale and
//! never mutate them in place.

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;

/// Well-known namespace names.
pub mod ns {
    pub const SEARCH: &str = "search";
    pub const CATALOG: &str = "catalog";
    pub const STREAMS: &str = "streams";
    pub const METADATA: &str = "cinemeta";
    pub const RESOLVED: &str = "resolved";
    pub const META: &str = "meta";
    pub const PAGE_URL: &str = "pageurl";
    pub const TMDB_ID: &str = "tmdbid";
}

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Expiry and capacity policy for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NamespacePolicy {
    #[serde(rename = "ttl_secs", with = "secs")]
    pub ttl: Duration,
    pub max_entries: usize,
}

impl NamespacePolicy {
    pub const fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries }
    }

    const fn secs(ttl: u64, max_entries: usize) -> Self {
        Self::new(Duration::from_secs(ttl), max_entries)
    }
}

/// Policy for namespaces missing from the table.
pub const DEFAULT_POLICY: NamespacePolicy = NamespacePolicy::secs(15 * MINUTE, 100);

/// The pre-registered namespace table.
pub fn default_policies() -> HashMap<String, NamespacePolicy> {
    [
        (ns::SEARCH, NamespacePolicy::secs(15 * MINUTE, 100)),
        (ns::CATALOG, NamespacePolicy::secs(30 * MINUTE, 50)),
        (ns::STREAMS, NamespacePolicy::secs(2 * HOUR, 200)),
        (ns::METADATA, NamespacePolicy::secs(24 * HOUR, 500)),
        (ns::RESOLVED, NamespacePolicy::secs(30 * MINUTE, 300)),
        (ns::META, NamespacePolicy::secs(2 * HOUR, 200)),
        (ns::PAGE_URL, NamespacePolicy::secs(2 * HOUR, 200)),
        (ns::TMDB_ID, NamespacePolicy::secs(24 * HOUR, 500)),
    ]
    .into_iter()
    .map(|(name, policy)| (name.to_string(), policy))
    .collect()
}

type Value = Arc<dyn Any + Send + Sync>;

struct Entry {
    value: Value,
    expires_at: Instant,
}

#[derive(Default)]
struct Table {
    entries: HashMap<String, Entry>,
    // Insertion order, oldest first.
    order: VecDeque<String>,
}

impl Table {
    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// Process-lifetime cache shared by the resolver, page locator and origin.
pub struct CacheStore {
    policies: HashMap<String, NamespacePolicy>,
    tables: Mutex<HashMap<String, Table>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_policies(default_policies())
    }

    /// Build a store with a custom namespace table. Namespaces not in the
    /// table use [`DEFAULT_POLICY`].
    pub fn with_policies(policies: HashMap<String, NamespacePolicy>) -> Self {
        Self {
            policies,
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self, namespace: &str) -> NamespacePolicy {
        self.policies
            .get(namespace)
            .copied()
            .unwrap_or(DEFAULT_POLICY)
    }

    /// Look up a live value. An expired entry is purged and reported absent.
    /// A value stored under a different type is also reported absent.
    pub fn get<T>(&self, namespace: &str, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.get_mut(namespace)?;
        let entry = table.entries.get(key)?;

        if Instant::now() >= entry.expires_at {
            table.remove(key);
            return None;
        }

        entry.value.downcast_ref::<T>().cloned()
    }

    /// Insert or replace a value. Inserting a new key into a full namespace
    /// evicts the oldest-inserted entry first.
    pub fn set<T>(&self, namespace: &str, key: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        let policy = self.policy(namespace);
        if policy.max_entries == 0 {
            return;
        }

        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(namespace.to_string()).or_default();

        let entry = Entry {
            value: Arc::new(value),
            expires_at: Instant::now() + policy.ttl,
        };

        if let Some(existing) = table.entries.get_mut(key) {
            // Replacement keeps the original insertion slot.
            *existing = entry;
            return;
        }

        while table.entries.len() >= policy.max_entries {
            let Some(oldest) = table.order.pop_front() else {
                break;
            };
            table.entries.remove(&oldest);
        }

        table.order.push_back(key.to_string());
        table.entries.insert(key.to_string(), entry);
    }

    /// Live entry count per namespace. Read-only: expired entries are skipped
    /// but not purged.
    pub fn stats(&self) -> BTreeMap<String, usize> {
        let now = Instant::now();
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .iter()
            .map(|(name, table)| {
                let live = table
                    .entries
                    .values()
                    .filter(|e| now < e.expires_at)
                    .count();
                (name.clone(), live)
            })
            .collect()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
