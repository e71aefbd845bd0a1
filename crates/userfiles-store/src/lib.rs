//! User Files Realm Storage Layer
//!
//! This crate reads per-user records from a directory tree laid out as
//! `<root>/<username>/<record-file>` and turns them into [`Principal`]s.

pub mod backend;
pub mod error;
pub mod local;
pub mod principal;
pub mod record;

pub use backend::{RecordStore, validate_username};
pub use error::StoreError;
pub use local::{FileStoreConfig, FileUserStore};
pub use principal::Principal;
pub use record::{RecordFormat, UserRecord};
