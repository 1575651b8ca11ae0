//! Finding extraction binaries on disk

use crate::config::ToolsConfig;
use crate::error::{Error, Result};
use crate::types::ToolKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where `tar` lives when nothing else is configured
const SYSTEM_TAR: &str = "/usr/bin/tar";

/// Resolves a [`ToolKind`] to an executable path
#[derive(Clone, Debug)]
pub struct ToolLocator {
    config: ToolsConfig,
}

impl ToolLocator {
    /// Create a locator from the tools configuration
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    fn explicit_path(&self, tool: ToolKind) -> Option<&Path> {
        match tool {
            ToolKind::Unrar => self.config.unrar_path.as_deref(),
            ToolKind::SevenZip => self.config.sevenzip_path.as_deref(),
            ToolKind::Unar => self.config.unar_path.as_deref(),
            ToolKind::Tar => self.config.tar_path.as_deref(),
        }
    }

    /// Find the executable for `tool`
    ///
    /// An explicitly configured path wins and must exist. Bundled tools are
    /// then looked up in `bundle_dir`; when a bundle directory is configured a
    /// missing bundled binary is an error rather than a reason to search PATH.
    /// `tar` is taken from PATH, then `/usr/bin/tar`.
    pub fn locate(&self, tool: ToolKind) -> Result<PathBuf> {
        if let Some(path) = self.explicit_path(tool) {
            return existing(tool, path);
        }

        if tool != ToolKind::Tar
            && let Some(dir) = &self.config.bundle_dir
        {
            return existing(tool, &dir.join(tool.binary_name()));
        }

        if self.config.search_path
            && let Ok(path) = which::which(tool.binary_name())
        {
            debug!(%tool, ?path, "found tool in PATH");
            return Ok(path);
        }

        if tool == ToolKind::Tar {
            return existing(tool, Path::new(SYSTEM_TAR));
        }

        Err(Error::ToolMissing {
            tool,
            location: if self.config.search_path {
                "PATH".to_string()
            } else {
                "configuration (PATH search disabled)".to_string()
            },
        })
    }

    /// Whether `tool` can be located
    pub fn is_available(&self, tool: ToolKind) -> bool {
        self.locate(tool).is_ok()
    }
}

fn existing(tool: ToolKind, path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        debug!(%tool, ?path, "using configured tool");
        Ok(path.to_path_buf())
    } else {
        Err(Error::ToolMissing {
            tool,
            location: path.display().to_string(),
        })
    }
}
