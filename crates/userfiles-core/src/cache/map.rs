//! Thread-safe username to principal maps

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use userfiles_store::Principal;

/// Map from username to its resolved principal.
///
/// Entries are only ever inserted or replaced wholesale.
pub trait PrincipalMap: Send + Sync {
    fn get(&self, username: &str) -> Option<Arc<Principal>>;

    /// Insert or replace; returns true if an entry was replaced
    fn insert(&self, username: String, principal: Arc<Principal>) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of cached usernames, in no particular order
    fn usernames(&self) -> Vec<String>;
}

/// A `HashMap` behind a single mutex
#[derive(Default)]
pub struct LockedMap {
    inner: Mutex<HashMap<String, Arc<Principal>>>,
}

impl LockedMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrincipalMap for LockedMap {
    fn get(&self, username: &str) -> Option<Arc<Principal>> {
        self.inner.lock().get(username).cloned()
    }

    fn insert(&self, username: String, principal: Arc<Principal>) -> bool {
        self.inner.lock().insert(username, principal).is_some()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn usernames(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }
}

/// A sharded concurrent map
#[derive(Default)]
pub struct ShardedMap {
    inner: DashMap<String, Arc<Principal>>,
}

impl ShardedMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrincipalMap for ShardedMap {
    fn get(&self, username: &str) -> Option<Arc<Principal>> {
        self.inner.get(username).map(|entry| Arc::clone(entry.value()))
    }

    fn insert(&self, username: String, principal: Arc<Principal>) -> bool {
        self.inner.insert(username, principal).is_some()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn usernames(&self) -> Vec<String> {
        self.inner.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Error type for parsing a map kind
#[derive(Debug, Clone)]
pub struct ParseMapKindError(String);

impl fmt::Display for ParseMapKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid cache map kind: {}", self.0)
    }
}

impl std::error::Error for ParseMapKindError {}

/// Which [`PrincipalMap`] implementation backs the cache
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// One coarse lock around every access
    #[default]
    Locked,
    /// Per-shard locks
    Sharded,
}

impl MapKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapKind::Locked => "locked",
            MapKind::Sharded => "sharded",
        }
    }

    pub fn build(&self) -> Box<dyn PrincipalMap> {
        match self {
            MapKind::Locked => Box::new(LockedMap::new()),
            MapKind::Sharded => Box::new(ShardedMap::new()),
        }
    }
}

impl FromStr for MapKind {
    type Err = ParseMapKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" => Ok(MapKind::Locked),
            "sharded" => Ok(MapKind::Sharded),
            _ => Err(ParseMapKindError(s.to_string())),
        }
    }
}
