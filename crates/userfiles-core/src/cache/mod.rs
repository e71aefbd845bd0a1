//! Principal cache module

mod manager;
mod map;

pub use manager::{CacheConfig, CacheStats, PrincipalCache};
pub use map::{LockedMap, MapKind, PrincipalMap, ShardedMap};
