//! Bearer credential persistence
//!
//! The credential store is the client-side session: [`crate::ApiClient`] reads the
//! token from it for every authenticated request, login writes it, and an
//! expired session clears it.

use crate::error::ClientResult;
use async_trait::async_trait;
use boardctrl_core::Credentials;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage for the signed-in user's bearer credential
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any
    async fn load(&self) -> ClientResult<Option<Credentials>>;

    /// Replace the stored credential
    async fn save(&self, credentials: &Credentials) -> ClientResult<()>;

    /// Forget the stored credential; clearing an empty store is not an error
    async fn clear(&self) -> ClientResult<()>;
}

/// Credential store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store at the given path; nothing is touched until first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> ClientResult<Option<Credentials>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored credential");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(credentials)?;
        tokio::fs::write(&self.path, body).await?;

        info!(
            path = %self.path.display(),
            user = %credentials.user_name,
            "Stored credential"
        );
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Cleared stored credential");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a token
    pub fn with_token(token: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(Some(Credentials {
                token: token.into(),
                user_name: user_name.into(),
            })),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> ClientResult<Option<Credentials>> {
        Ok(self.inner.read().clone())
    }

    async fn save(&self, credentials: &Credentials) -> ClientResult<()> {
        *self.inner.write() = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        *self.inner.write() = None;
        Ok(())
    }
}
