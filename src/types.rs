//! Core types and events

use crate::error::{Result, SelectionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Archive kind derived from the file name (no magic-byte sniffing)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// RAR archive (.rar, including .partNN.rar volumes)
    Rar,
    /// ZIP archive (.zip)
    Zip,
    /// 7-Zip archive (.7z)
    SevenZip,
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    TarGz,
    /// Bzip2-compressed tarball (.tar.bz2, .tbz)
    TarBz2,
    /// Uncompressed tarball (.tar)
    Tar,
    /// Anything else
    Unsupported,
}

impl ArchiveKind {
    /// Short human-readable label used in status messages
    pub fn label(self) -> &'static str {
        match self {
            ArchiveKind::Rar => "RAR",
            ArchiveKind::Zip => "ZIP",
            ArchiveKind::SevenZip => "7z",
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::TarBz2 => "tar.bz2",
            ArchiveKind::Tar => "tar",
            ArchiveKind::Unsupported => "unsupported",
        }
    }

    /// Whether an extraction tool exists for this kind
    pub fn is_supported(self) -> bool {
        !matches!(self, ArchiveKind::Unsupported)
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// External extraction tools nekorar knows how to drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// `unrar`, primary RAR extractor
    Unrar,
    /// `7za`, used for ZIP and 7z
    SevenZip,
    /// `unar`, RAR fallback
    Unar,
    /// System `tar`
    Tar,
}

impl ToolKind {
    /// Executable file name
    pub fn binary_name(self) -> &'static str {
        match self {
            ToolKind::Unrar => "unrar",
            ToolKind::SevenZip => "7za",
            ToolKind::Unar => "unar",
            ToolKind::Tar => "tar",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// What the user picked, before anything has been checked
///
/// Every field is optional because a front-end can trigger extraction at any
/// point; [`Selection::into_request`] is where missing pieces become errors.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    /// Archive to extract
    pub source: Option<PathBuf>,
    /// Password typed by the user (empty means none)
    pub password: Option<String>,
    /// Folder to extract into
    pub destination: Option<PathBuf>,
}

impl Selection {
    /// Turn the selection into an immutable request
    ///
    /// The source is checked first, matching the order a user fills the form in.
    pub fn into_request(self) -> Result<ArchiveRequest> {
        let source = self.source.ok_or(SelectionError::NoSource)?;
        let destination = self.destination.ok_or(SelectionError::NoDestination)?;
        let password = self.password.filter(|p| !p.is_empty());
        Ok(ArchiveRequest {
            source,
            password,
            destination,
        })
    }
}

/// One extraction attempt: immutable once built
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveRequest {
    /// Archive file to extract
    pub source: PathBuf,
    /// Password for encrypted archives
    pub password: Option<String>,
    /// Destination folder
    pub destination: PathBuf,
}

impl ArchiveRequest {
    /// Build a request directly (no optional fields)
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        password: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            password: password.filter(|p| !p.is_empty()),
            destination: destination.into(),
        }
    }

    /// Same request with a different source file (used to start from volume one)
    pub fn with_source(&self, source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            ..self.clone()
        }
    }
}

/// Structured classification of a finished extraction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Tool reported success
    Success,
    /// RAR tool failed and reported checksum/CRC errors
    CorruptOrMissingVolume,
    /// Tool failed for any other reason
    Failed,
}

/// Result of running an extraction tool (produced once per attempt)
#[must_use]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Whether the archive was extracted
    pub succeeded: bool,
    /// Exit code of the deciding process (-1 when killed by a signal)
    pub exit_code: i32,
    /// Combined stdout and stderr of the deciding process
    pub combined_output: String,
    /// Structured classification
    pub status: OutcomeStatus,
    /// Tool whose result decided the outcome
    pub tool: ToolKind,
    /// Whether the RAR fallback tool decided the outcome
    pub used_fallback: bool,
}

/// Event published by the extraction session
///
/// Front-ends render these three signals: status text, progress, and completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Status line changed
    Status {
        /// Text to show the user
        message: String,
    },

    /// Progress moved (0.0 to 1.0)
    Progress {
        /// Fraction complete
        fraction: f32,
    },

    /// Attempt finished (successfully or not); the session accepts new work again
    Completed {
        /// Whether the archive was extracted
        succeeded: bool,
        /// Final status text
        message: String,
        /// Destination folder, present on success
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<PathBuf>,
    },
}
