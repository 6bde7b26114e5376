use crate::auth::credential::Credential;
use crate::error::{AppError, Result};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the cached credential inside the cache directory.
pub const CACHE_FILE_NAME: &str = "sheets.googleapis.com-go-quickstart.json";

/// On-disk store for a single credential.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the cache directory, owner-only, if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }

        DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(parent)
            .map_err(|e| {
                AppError::Auth(format!("Failed to create token cache directory: {}", e))
            })?;
        debug!(path = ?parent, "Created token cache directory");

        Ok(())
    }

    /// Read the cached credential. `Ok(None)` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to read tokens file: {}", e)))?;

        let credential: Credential = serde_json::from_str(&contents)
            .map_err(|e| AppError::Auth(format!("Failed to parse tokens: {}", e)))?;

        Ok(Some(credential))
    }

    /// Write the credential, replacing whatever was cached before.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        self.ensure_dir()?;

        let contents = serde_json::to_string_pretty(credential)
            .map_err(|e| AppError::Auth(format!("Failed to serialize tokens: {}", e)))?;

        // Owner-only from creation so the token is never world-readable
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to create tokens file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Auth(format!("Failed to write tokens file: {}", e)))?;

        info!(path = ?self.path, "Saved credential file");

        Ok(())
    }

    /// Delete the cached credential, if any.
    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            debug!("No cached tokens to clear");
            return Ok(());
        }

        fs::remove_file(&self.path)
            .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
        info!(path = ?self.path, "Cleared cached tokens");

        Ok(())
    }
}
