//! Record store trait

use std::path::PathBuf;

use crate::error::StoreError;
use crate::principal::Principal;

/// Record store trait
///
/// Implementations translate a username into a [`Principal`] by reading
/// exactly one record. Loads are blocking and may be called concurrently
/// from many threads.
pub trait RecordStore: Send + Sync {
    /// Read and parse the record for `username`
    fn load(&self, username: &str) -> Result<Principal, StoreError>;

    /// Location of the record `load` would read, for diagnostics
    fn describe(&self, username: &str) -> PathBuf;
}

/// Reject usernames that would escape their own record directory
pub fn validate_username(username: &str) -> Result<(), StoreError> {
    let invalid = username.is_empty()
        || username == "."
        || username == ".."
        || username.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StoreError::InvalidUsername(username.to_string()));
    }
    Ok(())
}
