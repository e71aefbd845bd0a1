//! Storage error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("User record not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Malformed user record at {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

impl StoreError {
    /// Whether this is the ordinary "unknown user" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::InvalidUsername(_))
    }
}
