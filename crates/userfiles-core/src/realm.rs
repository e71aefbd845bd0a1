//! Host-facing realm

use std::sync::Arc;
use tracing::warn;
use userfiles_store::{FileUserStore, Principal, RecordStore};

use crate::cache::{CacheConfig, CacheStats, PrincipalCache};
use crate::config::RealmConfig;
use crate::credential::CredentialBuilder;

/// Realm that authenticates against per-user record files.
///
/// One instance owns one principal cache; the host holds it (typically in
/// an `Arc`) for the lifetime of the process. Unknown users, malformed
/// records and credential build failures all look the same to the caller.
pub struct UserFilesRealm {
    cache: PrincipalCache,
}

impl UserFilesRealm {
    pub const NAME: &'static str = "UserFilesRealm";

    /// Create a realm over any record store
    pub fn new(store: Arc<dyn RecordStore>, config: CacheConfig) -> Self {
        Self {
            cache: PrincipalCache::new(store, config),
        }
    }

    /// Create a realm reading records from the filesystem
    pub fn from_config(config: &RealmConfig) -> Self {
        let store = FileUserStore::new(config.store.to_file_store_config());
        Self::new(Arc::new(store), config.cache.clone())
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Resolve a username, honoring the reload marker
    pub fn resolve(&self, username: &str) -> Option<Arc<Principal>> {
        self.cache.resolve(username)
    }

    /// Stored password for a username
    pub fn password(&self, username: &str) -> Option<String> {
        self.cache.password(username)
    }

    /// Resolve a username and build the host's credential object from it
    pub fn credential<B: CredentialBuilder>(
        &self,
        username: &str,
        builder: &B,
    ) -> Option<B::Credential> {
        let principal = self.resolve(username)?;

        match builder.build(principal.username(), principal.password(), principal.roles()) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    "Failed to build credential for {}: {}",
                    principal.username(),
                    e
                );
                None
            }
        }
    }

    /// Resolve on the blocking thread pool, for async hosts
    pub async fn resolve_async(self: &Arc<Self>, username: &str) -> Option<Arc<Principal>> {
        let realm = Arc::clone(self);
        let username = username.to_string();

        match tokio::task::spawn_blocking(move || realm.resolve(&username)).await {
            Ok(principal) => principal,
            Err(e) => {
                warn!("Principal resolution task failed: {}", e);
                None
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &PrincipalCache {
        &self.cache
    }
}
