//! Configuration types for nekorar

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// External tool locations
///
/// Each tool is resolved in order: explicit path, `bundle_dir/<binary>`, then
/// PATH (when `search_path` is set). `tar` is a system tool and never comes
/// from the bundle directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory holding the bundled `unrar`, `7za` and `unar` binaries
    #[serde(default)]
    pub bundle_dir: Option<PathBuf>,

    /// Path to unrar executable (auto-detected if None)
    #[serde(default)]
    pub unrar_path: Option<PathBuf>,

    /// Path to 7za executable (auto-detected if None)
    #[serde(default)]
    pub sevenzip_path: Option<PathBuf>,

    /// Path to unar executable (auto-detected if None)
    #[serde(default)]
    pub unar_path: Option<PathBuf>,

    /// Path to tar executable (auto-detected if None)
    #[serde(default)]
    pub tar_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Retry failed RAR extractions with unar (default: true)
    #[serde(default = "default_true")]
    pub rar_fallback: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bundle_dir: None,
            unrar_path: None,
            sevenzip_path: None,
            unar_path: None,
            tar_path: None,
            search_path: true,
            rar_fallback: true,
        }
    }
}

/// Extraction behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Case-insensitive substrings that mark a failed RAR run as corruption
    #[serde(default = "default_corruption_markers")]
    pub corruption_markers: Vec<String>,

    /// Open the destination in the platform file manager after success (default: false)
    #[serde(default)]
    pub open_destination: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            corruption_markers: default_corruption_markers(),
            open_destination: false,
        }
    }
}

/// Where remembered state lives
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// State file path (default: `<config dir>/nekorar/state.json`)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StateConfig {
    /// Effective state file path
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_state_path)
    }
}

/// Main configuration
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// External tool locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Extraction behavior
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Persisted state location
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every extraction fail
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.tools.bundle_dir
            && !dir.is_dir()
        {
            return Err(Error::Config {
                message: format!("bundle directory {} is not a directory", dir.display()),
                key: Some("tools.bundle_dir".to_string()),
            });
        }

        if self
            .extraction
            .corruption_markers
            .iter()
            .all(|m| m.trim().is_empty())
        {
            return Err(Error::Config {
                message: "at least one non-empty corruption marker is required".to_string(),
                key: Some("extraction.corruption_markers".to_string()),
            });
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_corruption_markers() -> Vec<String> {
    vec!["checksum error".to_string(), "crc failed".to_string()]
}

fn default_state_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nekorar")
        .join("state.json")
}
