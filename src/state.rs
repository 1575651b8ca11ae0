//! Persisted state: remembered destination and pending launch file
//!
//! Stored as a small JSON document with fixed keys. Writes go to a temporary
//! file next to the target and are renamed into place.

use crate::destination::{AccessToken, DestinationAccess};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything nekorar remembers between runs
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Access token for the last chosen destination
    #[serde(default, rename = "last_destination_token")]
    pub destination_token: Option<AccessToken>,

    /// Plain path of the last chosen destination (used when the token is stale)
    #[serde(default, rename = "last_destination_path")]
    pub destination_path: Option<PathBuf>,

    /// Archive handed over by another process, waiting to be picked up
    #[serde(default, rename = "launch_file_path")]
    pub launch_file: Option<PathBuf>,

    /// When the state was last written
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// JSON-file backed state store
#[derive(Clone, Debug)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by the file at `path` (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current state; a missing file is an empty state
    pub fn load(&self) -> Result<PersistedState> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `state`, replacing the file atomically
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut state = state.clone();
        state.updated_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(&state)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = ?self.path, "state saved");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut PersistedState)) -> Result<PersistedState> {
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    /// Remember `folder` as the destination, with a token and a plain-path fallback
    ///
    /// A folder that cannot be tokenized is still remembered by path.
    pub fn remember_destination(
        &self,
        access: &dyn DestinationAccess,
        folder: &Path,
    ) -> Result<()> {
        let token = match access.issue_token(folder) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(?folder, error = %e, "could not create destination token");
                None
            }
        };
        self.update(|state| {
            state.destination_token = token;
            state.destination_path = Some(folder.to_path_buf());
        })?;
        info!(?folder, "destination remembered");
        Ok(())
    }

    /// Resolve the remembered destination
    ///
    /// The token is tried first; when it is missing or stale the plain path is
    /// used if that directory still exists.
    pub fn restore_destination(&self, access: &dyn DestinationAccess) -> Result<Option<PathBuf>> {
        let state = self.load()?;

        if let Some(token) = &state.destination_token {
            match access.resolve_token(token) {
                Ok(folder) => return Ok(Some(folder)),
                Err(e) => warn!(error = %e, "remembered destination token could not be resolved"),
            }
        }

        Ok(state.destination_path.filter(|p| p.is_dir()))
    }

    /// Record an archive for the next run to pick up
    pub fn set_launch_file(&self, file: &Path) -> Result<()> {
        self.update(|state| state.launch_file = Some(file.to_path_buf()))?;
        info!(?file, "launch file recorded");
        Ok(())
    }

    /// Take the pending launch file, clearing it
    pub fn take_launch_file(&self) -> Result<Option<PathBuf>> {
        let mut state = self.load()?;
        let Some(file) = state.launch_file.take() else {
            return Ok(None);
        };
        self.save(&state)?;
        Ok(Some(file))
    }
}
