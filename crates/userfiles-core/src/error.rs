//! Core error types

use thiserror::Error;

/// Failure to build the host's credential object from a principal
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Unsupported credential shape: {0}")]
    Unsupported(String),
}
