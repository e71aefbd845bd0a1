//! Filesystem record store

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backend::{RecordStore, validate_username};
use crate::error::StoreError;
use crate::principal::Principal;
use crate::record::RecordFormat;

/// Settings for [`FileUserStore`]
#[derive(Debug, Clone, Default)]
pub struct FileStoreConfig {
    /// Users root as configured
    pub root: PathBuf,
    /// Host base directory, used when `root` is not a readable directory on its own
    pub base_dir: Option<PathBuf>,
    /// Record serialization
    pub format: RecordFormat,
    /// Record file name, defaults to the format's file name
    pub record_file: Option<String>,
}

/// Filesystem record store
///
/// Reads records laid out as `<root>/<username>/<record_file>`. The root is
/// re-resolved on every load so a directory created after startup is
/// picked up without a restart.
#[derive(Debug, Clone)]
pub struct FileUserStore {
    root: PathBuf,
    base_dir: Option<PathBuf>,
    format: RecordFormat,
    record_file: String,
}

impl FileUserStore {
    /// Create a new filesystem record store
    pub fn new(config: FileStoreConfig) -> Self {
        let record_file = config
            .record_file
            .unwrap_or_else(|| config.format.default_file_name().to_string());

        info!(
            "Initialized user record store (root: {:?}, base: {:?}, format: {}, file: {})",
            config.root,
            config.base_dir,
            config.format.as_str(),
            record_file
        );

        Self {
            root: config.root,
            base_dir: config.base_dir,
            format: config.format,
            record_file,
        }
    }

    /// Resolve the users root, falling back to the base directory
    pub fn users_root(&self) -> PathBuf {
        if is_readable_dir(&self.root) {
            return self.root.clone();
        }
        match &self.base_dir {
            Some(base) => base.join(&self.root),
            None => self.root.clone(),
        }
    }

    /// Get the record path for a username
    fn record_path(&self, username: &str) -> PathBuf {
        self.users_root().join(username).join(&self.record_file)
    }

    fn read_record(&self, username: &str, path: &Path) -> Result<Principal, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("No readable user record at {:?}: {}", path, e);
                return Err(StoreError::NotFound(path.to_path_buf()));
            }
        };

        let content = String::from_utf8(bytes).map_err(|_| StoreError::Malformed {
            path: path.to_path_buf(),
            reason: "record is not valid UTF-8".to_string(),
        })?;

        let record = self
            .format
            .parse(&content)
            .map_err(|e| StoreError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(record.into_principal(username))
    }
}

fn is_readable_dir(path: &Path) -> bool {
    path.is_dir() && fs::read_dir(path).is_ok()
}

impl RecordStore for FileUserStore {
    fn load(&self, username: &str) -> Result<Principal, StoreError> {
        validate_username(username)?;

        let path = self.record_path(username);
        debug!("Reading user record from {:?}", path);

        let result = self.read_record(username, &path);
        if let Err(StoreError::Malformed { path, reason }) = &result {
            let shown = path.canonicalize().unwrap_or_else(|_| path.clone());
            warn!("Failed to read user info at {}: {}", shown.display(), reason);
        }
        result
    }

    fn describe(&self, username: &str) -> PathBuf {
        self.record_path(username)
    }
}
