//! Persistence of the signed-in user identifier.
//!
//! The session is a single secret string (the user id) kept in a
//! [`SecureStore`]. [`SessionStore`] wraps a secure store with the
//! application's policy: storage failures are logged and treated as
//! "no session", never propagated, so a broken keychain degrades to the
//! guest experience instead of an error screen.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use taskpad_proto::UserId;
use tokio::io::AsyncWriteExt;

use crate::storage::StorageError;

/// Label under which the secret is stored.
const SECRET_KEY: &str = "session";

/// Store for a single secret value.
pub trait SecureStore: Send + Sync {
    /// Persist `secret`, replacing any previous value.
    fn set_secret(
        &self,
        secret: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Read the stored secret, if any.
    fn get_secret(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Remove the stored secret. Clearing an empty store is not an error.
    fn clear_secret(&self) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// In-memory [`SecureStore`]. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySecureStore {
    secret: Arc<Mutex<Option<String>>>,
}

impl MemorySecureStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, secret: &str) -> Result<(), StorageError> {
        *self.secret.lock() = Some(secret.to_string());
        Ok(())
    }

    async fn get_secret(&self) -> Result<Option<String>, StorageError> {
        Ok(self.secret.lock().clone())
    }

    async fn clear_secret(&self) -> Result<(), StorageError> {
        *self.secret.lock() = None;
        Ok(())
    }
}

/// [`SecureStore`] backed by a single owner-only file.
///
/// On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileSecureStore {
    path: PathBuf,
}

impl FileSecureStore {
    /// Create a store that keeps its secret at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the secret file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(source: std::io::Error) -> StorageError {
        StorageError::Io {
            key: SECRET_KEY.to_string(),
            source,
        }
    }
}

impl SecureStore for FileSecureStore {
    async fn set_secret(&self, secret: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(Self::io_error)?;
        }
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path).await.map_err(Self::io_error)?;

        // `mode` only applies on create; tighten a file left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(Self::io_error)?;
        }

        file.write_all(secret.as_bytes())
            .await
            .map_err(Self::io_error)?;
        file.flush().await.map_err(Self::io_error)?;
        Ok(())
    }

    async fn get_secret(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents.trim_end().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(e)),
        }
    }

    async fn clear_secret(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(e)),
        }
    }
}

/// The signed-in user id, persisted in a [`SecureStore`].
#[derive(Debug, Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: SecureStore> SessionStore<S> {
    /// Wrap a secure store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Record `uid` as the signed-in user. Failures are logged.
    pub async fn set_session(&self, uid: &UserId) {
        if let Err(err) = self.store.set_secret(uid.as_str()).await {
            tracing::error!(error = %err, "failed to store session");
        }
    }

    /// The signed-in user, or `None` for a guest.
    ///
    /// An empty stored value counts as no session. Read failures are
    /// logged and also count as no session.
    pub async fn get_session(&self) -> Option<UserId> {
        match self.store.get_secret().await {
            Ok(Some(secret)) if !secret.is_empty() => Some(UserId::new(secret)),
            Ok(_) => None,
            Err(err) => {
                tracing::error!(error = %err, "failed to read session");
                None
            }
        }
    }

    /// Forget the signed-in user. Failures are logged.
    pub async fn clear_session(&self) {
        if let Err(err) = self.store.clear_secret().await {
            tracing::error!(error = %err, "failed to clear session");
        }
    }
}
