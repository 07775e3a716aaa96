//! Credential storage for the bearer token.
//!
//! The core depends only on the three-operation [`CredentialStore`] seam;
//! device storage lives behind it. Writers always replace the whole value.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::CredentialError;
use crate::types::AuthToken;

/// Persists the token across sessions.
///
/// `get` returning `Err` means the store itself failed; the request
/// interceptor treats that as fatal for the request.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<AuthToken>, CredentialError>;

    async fn set(&self, token: AuthToken) -> Result<(), CredentialError>;

    async fn clear(&self) -> Result<(), CredentialError>;
}

/// Process-local store, mostly for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<AuthToken>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<AuthToken>, CredentialError> {
        Ok(self.token.read().await.clone())
    }

    async fn set(&self, token: AuthToken) -> Result<(), CredentialError> {
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.token.write().await = None;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: AuthToken,
}

/// Token persisted as a small JSON document on disk.
///
/// A missing or corrupt document reads as "no token"; other I/O failures
/// are reported.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<AuthToken>, CredentialError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<StoredToken>(&raw) {
            Ok(stored) if !stored.token.is_empty() => Ok(Some(stored.token)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt credential file");
                Ok(None)
            }
        }
    }

    async fn set(&self, token: AuthToken) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(&StoredToken { token })?;
        // Write-then-rename: readers never see a partial document.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        info!(path = %self.path.display(), "credential stored");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "credential cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no credential to clear");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
