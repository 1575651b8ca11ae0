//! Capability-scoped destination folder access
//!
//! Sandboxed platforms only let an application write to a user-chosen folder
//! while it holds an access grant, and the grant is persisted as an opaque
//! token. [`DestinationAccess`] is that seam; [`FsDestinationAccess`] is the
//! plain-filesystem implementation where a token is just the canonical path.
//!
//! [`DestinationLease`] holds one grant for the duration of an extraction and
//! ends it exactly once, either explicitly via [`DestinationLease::release`]
//! or when dropped.

use crate::error::{PermissionError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opaque, persistable grant for a destination folder
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Grants and revokes access to destination folders
pub trait DestinationAccess: Send + Sync {
    /// Create a token that can later be resolved back to `folder`
    fn issue_token(&self, folder: &Path) -> Result<AccessToken>;

    /// Resolve a stored token to a folder path
    ///
    /// # Errors
    ///
    /// [`PermissionError::TokenInvalid`] when the token is malformed or stale.
    fn resolve_token(&self, token: &AccessToken) -> Result<PathBuf>;

    /// Start accessing `folder`; every successful call is paired with one `end_access`
    fn begin_access(&self, folder: &Path) -> Result<()>;

    /// Stop accessing `folder`
    fn end_access(&self, folder: &Path);
}

/// Plain filesystem access: no sandbox, tokens are canonical paths
#[derive(Debug, Default, Clone)]
pub struct FsDestinationAccess;

const TOKEN_PREFIX: &str = "path:";

impl DestinationAccess for FsDestinationAccess {
    fn issue_token(&self, folder: &Path) -> Result<AccessToken> {
        let canonical = folder
            .canonicalize()
            .map_err(|_| PermissionError::DestinationMissing {
                path: folder.to_path_buf(),
            })?;
        Ok(AccessToken(format!(
            "{}{}",
            TOKEN_PREFIX,
            canonical.display()
        )))
    }

    fn resolve_token(&self, token: &AccessToken) -> Result<PathBuf> {
        let raw = token
            .0
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| PermissionError::TokenInvalid {
                reason: "unrecognized token format".to_string(),
            })?;
        let path = PathBuf::from(raw);
        if !path.is_dir() {
            return Err(PermissionError::TokenInvalid {
                reason: format!("{} no longer exists", path.display()),
            }
            .into());
        }
        Ok(path)
    }

    fn begin_access(&self, folder: &Path) -> Result<()> {
        debug!(?folder, "destination access started");
        Ok(())
    }

    fn end_access(&self, folder: &Path) {
        debug!(?folder, "destination access ended");
    }
}

/// One active grant on a destination folder
///
/// Released exactly once: by [`release`](Self::release) or on drop.
#[must_use = "dropping the lease ends destination access immediately"]
pub struct DestinationLease {
    access: Arc<dyn DestinationAccess>,
    folder: PathBuf,
    released: bool,
}

impl DestinationLease {
    /// Begin access to `folder`
    pub fn acquire(access: Arc<dyn DestinationAccess>, folder: &Path) -> Result<Self> {
        access.begin_access(folder).inspect_err(|e| {
            warn!(?folder, error = %e, "could not acquire destination access");
        })?;
        Ok(Self {
            access,
            folder: folder.to_path_buf(),
            released: false,
        })
    }

    /// Folder this lease covers
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// End access now
    pub fn release(mut self) {
        self.end();
    }

    fn end(&mut self) {
        if !self.released {
            self.released = true;
            self.access.end_access(&self.folder);
        }
    }
}

impl Drop for DestinationLease {
    fn drop(&mut self) {
        self.end();
    }
}

impl std::fmt::Debug for DestinationLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationLease")
            .field("folder", &self.folder)
            .field("released", &self.released)
            .finish()
    }
}
