//! User Files Realm Core
//!
//! This crate provides the principal cache, the host-facing realm and its
//! configuration. Principals are resolved cache-first and read from the
//! record store on a miss; a username prefixed with the reload marker
//! (`*` by default) forces a re-read of the record.

pub mod cache;
pub mod config;
pub mod credential;
pub mod error;
pub mod logging;
pub mod realm;

pub use cache::{
    CacheConfig, CacheStats, LockedMap, MapKind, PrincipalCache, PrincipalMap, ShardedMap,
};
pub use config::{BASE_DIR_ENV, RealmConfig, StoreConfig};
pub use credential::{CredentialBuilder, FnCredentialBuilder, credential_fn};
pub use error::CredentialError;
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use realm::UserFilesRealm;
pub use userfiles_store::{Principal, RecordFormat, RecordStore, StoreError};
