//! File-backed key/value storage.
//!
//! Each key maps to `<data_dir>/<key>.json`. Writes go to a temporary file
//! in the same directory and are renamed into place, so a crash mid-write
//! leaves the previous value intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StorageError};

/// [`KeyValueStore`] that keeps one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(['/', '\\'])
            || key.contains("..")
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(key, e))?;

        let tmp = self.root.join(format!(".{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(key, e))?;

        tracing::trace!(key, path = %path.display(), "stored value");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}
