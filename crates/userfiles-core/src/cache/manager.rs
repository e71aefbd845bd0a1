//! Principal cache implementation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use userfiles_store::{Principal, RecordStore};

use super::map::{MapKind, PrincipalMap};

/// Configuration for the principal cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Map implementation backing the cache
    #[serde(default)]
    pub map: MapKind,
    /// Leading character that forces a re-read of the user's record
    #[serde(default = "default_reload_marker")]
    pub reload_marker: char,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            map: MapKind::default(),
            reload_marker: default_reload_marker(),
        }
    }
}

fn default_reload_marker() -> char {
    '*'
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub reload_count: u64,
    pub failed_load_count: u64,
    pub entry_count: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    reloads: AtomicU64,
    failed_loads: AtomicU64,
}

/// Cache-first principal lookup backed by a record store.
///
/// The map lock is only held for individual reads and inserts, never
/// across a store load. Two concurrent misses for the same user may both
/// read the record; the last insert wins.
pub struct PrincipalCache {
    store: Arc<dyn RecordStore>,
    map: Box<dyn PrincipalMap>,
    reload_marker: char,
    counters: Counters,
}

impl PrincipalCache {
    /// Create a new principal cache
    pub fn new(store: Arc<dyn RecordStore>, config: CacheConfig) -> Self {
        info!(
            "Initializing principal cache (map: {}, reload marker: {:?})",
            config.map.as_str(),
            config.reload_marker
        );

        Self {
            store,
            map: config.map.build(),
            reload_marker: config.reload_marker,
            counters: Counters::default(),
        }
    }

    /// Resolve a username to its principal.
    ///
    /// A name starting with the reload marker first re-reads the record for
    /// the rest of the name and, if that succeeds, replaces the cached entry.
    /// The (stripped) name is then served from the cache, falling back to the
    /// store on a miss.
    pub fn resolve(&self, requested: &str) -> Option<Arc<Principal>> {
        let username = match requested.strip_prefix(self.reload_marker) {
            Some(real) => {
                self.force_reload(real);
                real
            }
            None => requested,
        };

        if let Some(principal) = self.map.get(username) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Principal cache hit: {}", username);
            return Some(principal);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Principal cache miss: {}", username);

        let principal = Arc::new(self.load(username)?);
        self.map.insert(username.to_string(), Arc::clone(&principal));
        Some(principal)
    }

    /// Stored password for a username, if the user resolves
    pub fn password(&self, username: &str) -> Option<String> {
        self.resolve(username).map(|p| p.password().to_string())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.counters.hits.load(Ordering::Relaxed),
            miss_count: self.counters.misses.load(Ordering::Relaxed),
            reload_count: self.counters.reloads.load(Ordering::Relaxed),
            failed_load_count: self.counters.failed_loads.load(Ordering::Relaxed),
            entry_count: self.map.len(),
        }
    }

    /// Usernames currently cached
    pub fn cached_usernames(&self) -> Vec<String> {
        self.map.usernames()
    }

    /// Re-read a record; an existing entry is only replaced on success
    fn force_reload(&self, username: &str) {
        self.counters.reloads.fetch_add(1, Ordering::Relaxed);
        info!("Forced reload of user record: {}", username);

        if let Some(principal) = self.load(username) {
            self.map.insert(username.to_string(), Arc::new(principal));
        }
    }

    /// Store failures are logged by the store and collapse to `None` here
    fn load(&self, username: &str) -> Option<Principal> {
        match self.store.load(username) {
            Ok(principal) => Some(principal),
            Err(e) => {
                self.counters.failed_loads.fetch_add(1, Ordering::Relaxed);
                let record = self.store.describe(username);
                debug!(
                    "No principal for {} (record {}): {}",
                    username,
                    record.display(),
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;
    use userfiles_store::{FileStoreConfig, FileUserStore, StoreError};

    /// Counts loads passed through to a file store
    struct CountingStore {
        inner: FileUserStore,
        loads: AtomicUsize,
        describes: AtomicUsize,
    }

    impl CountingStore {
        fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl RecordStore for CountingStore {
        fn load(&self, username: &str) -> Result<Principal, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(username)
        }

        fn describe(&self, username: &str) -> PathBuf {
            self.describes.fetch_add(1, Ordering::SeqCst);
            self.inner.describe(username)
        }
    }

    fn write_user(root: &Path, username: &str, password: &str, roles: &[&str]) {
        let dir = root.join(username);
        fs::create_dir_all(&dir).unwrap();
        let roles: String = roles
            .iter()
            .map(|r| format!("<name>{r}</name>"))
            .collect();
        fs::write(
            dir.join("user.xml"),
            format!(
                "<user><name>{username}</name><roles>{roles}</roles>\
                 <password>{password}</password></user>"
            ),
        )
        .unwrap();
    }

    fn setup(map: MapKind) -> (TempDir, Arc<CountingStore>, PrincipalCache) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CountingStore {
            inner: FileUserStore::new(FileStoreConfig {
                root: dir.path().to_path_buf(),
                ..Default::default()
            }),
            loads: AtomicUsize::new(0),
            describes: AtomicUsize::new(0),
        });
        let cache = PrincipalCache::new(
            store.clone(),
            CacheConfig {
                map,
                ..Default::default()
            },
        );
        (dir, store, cache)
    }

    #[test]
    fn test_first_resolve_reads_once_then_hits() {
        let (dir, store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);

        let first = cache.resolve("p.fogg").unwrap();
        assert_eq!(store.loads(), 1);

        let second = cache.resolve("p.fogg").unwrap();
        assert_eq!(store.loads(), 1);
        assert_eq!(first, second);

        assert_eq!(first.username(), "p.fogg");
        assert_eq!(first.password(), "password");
        assert_eq!(first.roles(), ["user"]);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_forced_reload_replaces_entry() {
        let (dir, store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);
        assert_eq!(cache.resolve("p.fogg").unwrap().password(), "password");

        write_user(dir.path(), "p.fogg", "newpass", &["user"]);
        assert_eq!(cache.resolve("p.fogg").unwrap().password(), "password");

        let reloaded = cache.resolve("*p.fogg").unwrap();
        assert_eq!(reloaded.username(), "p.fogg");
        assert_eq!(reloaded.password(), "newpass");
        assert_eq!(store.loads(), 2);

        assert_eq!(cache.resolve("p.fogg").unwrap().password(), "newpass");
        assert_eq!(store.loads(), 2);
        assert_eq!(cache.cached_usernames(), vec!["p.fogg".to_string()]);
    }

    #[test]
    fn test_forced_reload_always_reads() {
        let (dir, store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);

        cache.resolve("*p.fogg").unwrap();
        cache.resolve("*p.fogg").unwrap();
        cache.resolve("*p.fogg").unwrap();

        assert_eq!(store.loads(), 3);
        assert_eq!(cache.stats().reload_count, 3);
    }

    #[test]
    fn test_failed_reload_keeps_stale_entry() {
        let (dir, _store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);
        let cached = cache.resolve("p.fogg").unwrap();

        fs::remove_dir_all(dir.path().join("p.fogg")).unwrap();

        // The reload fails but the cached entry is still served for this call
        assert_eq!(cache.resolve("*p.fogg"), Some(cached.clone()));
        assert_eq!(cache.resolve("p.fogg"), Some(cached));
    }

    #[test]
    fn test_forced_reload_of_unknown_user() {
        let (_dir, store, cache) = setup(MapKind::Locked);

        assert!(cache.resolve("*ghost").is_none());
        // Reload read plus the miss fallback
        assert_eq!(store.loads(), 2);
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_unknown_user_never_cached() {
        let (_dir, store, cache) = setup(MapKind::Locked);

        for _ in 0..3 {
            assert!(cache.resolve("ghost").is_none());
        }
        assert_eq!(store.loads(), 3);
        assert_eq!(cache.stats().entry_count, 0);
        assert_eq!(cache.stats().failed_load_count, 3);
    }

    #[test]
    fn test_failed_load_describes_record() {
        let (dir, store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);

        cache.resolve("p.fogg").unwrap();
        assert_eq!(store.describes.load(Ordering::SeqCst), 0);

        assert!(cache.resolve("ghost").is_none());
        assert_eq!(store.describes.load(Ordering::SeqCst), 1);
        assert!(store.describe("ghost").ends_with("ghost/user.xml"));
    }

    #[test]
    fn test_malformed_record_is_not_found() {
        let (dir, _store, cache) = setup(MapKind::Locked);
        let user_dir = dir.path().join("broken");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(
            user_dir.join("user.xml"),
            "<user><password>x</password></user>",
        )
        .unwrap();

        assert!(cache.resolve("broken").is_none());
        assert!(cache.password("broken").is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_only_one_marker_is_stripped() {
        let (dir, _store, cache) = setup(MapKind::Locked);
        write_user(dir.path(), "p.fogg", "password", &["user"]);

        assert!(cache.resolve("**p.fogg").is_none());
        assert!(cache.resolve("*p.fogg").is_some());
    }

    #[test]
    fn test_custom_reload_marker() {
        let dir = TempDir::new().unwrap();
        write_user(dir.path(), "p.fogg", "password", &["user"]);
        let store = Arc::new(FileUserStore::new(FileStoreConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        }));
        let cache = PrincipalCache::new(
            store,
            CacheConfig {
                reload_marker: '!',
                ..Default::default()
            },
        );

        assert!(cache.resolve("!p.fogg").is_some());
        assert!(cache.resolve("*p.fogg").is_none());
    }

    #[test]
    fn test_password_convenience() {
        let (dir, _store, cache) = setup(MapKind::Sharded);
        write_user(dir.path(), "p.fogg", "password", &["user", "admin"]);

        assert_eq!(cache.password("p.fogg").as_deref(), Some("password"));
        assert_eq!(cache.password("ghost"), None);
    }

    #[test]
    fn test_concurrent_resolution() {
        for kind in [MapKind::Locked, MapKind::Sharded] {
            let (dir, store, cache) = setup(kind);
            write_user(dir.path(), "p.fogg", "password", &["user", "admin"]);

            let results: Vec<_> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..16)
                    .map(|_| s.spawn(|| cache.resolve("p.fogg")))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let expected = Principal::new(
                "p.fogg",
                "password",
                vec!["user".into(), "admin".into()],
                None,
            );
            for result in results {
                assert_eq!(*result.unwrap(), expected);
            }
            assert_eq!(cache.stats().entry_count, 1);
            assert!(store.loads() >= 1 && store.loads() <= 16);
        }
    }
}
