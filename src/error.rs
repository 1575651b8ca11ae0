//! Error types for nekorar
//!
//! Every failure an extraction attempt can hit is represented here, grouped by
//! where it is detected:
//! - selection errors (nothing to extract, nowhere to put it)
//! - permission errors (destination missing, unwritable, or access token stale)
//! - tool errors (binary missing, failed to start, non-zero exit)
//! - validation errors (incomplete multi-part volume set)
//!
//! None of these are fatal to the host. The session converts each one into the
//! status text published to subscribers via its `Display` implementation.

use crate::types::ToolKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nekorar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nekorar
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tools.bundle_dir")
        key: Option<String>,
    },

    /// Source or destination not chosen
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Destination folder cannot be used
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Multi-part volume set failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The external tool ran but did not extract the archive
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The file name does not map to any supported archive kind
    #[error("unsupported format: {path} (supported: RAR, ZIP, 7z, TAR, TAR.GZ/TGZ, TAR.BZ2/TBZ)")]
    UnsupportedFormat {
        /// The file that was rejected
        path: PathBuf,
    },

    /// Expected extraction binary is not where it should be
    #[error("{tool} executable not found at {location}")]
    ToolMissing {
        /// The tool that could not be located
        tool: ToolKind,
        /// Where the tool was looked for
        location: String,
    },

    /// The OS refused to start the external process
    #[error("failed to start {tool}: {source}")]
    Spawn {
        /// The tool that failed to start
        tool: String,
        /// The underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Another extraction is already in flight
    #[error("an extraction is already running")]
    Busy,

    /// A forwarded file reference could not be turned into a local path
    #[error("invalid handoff: {0}")]
    InvalidHandoff(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Nothing selected to work on
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// No archive file was chosen
    #[error("please choose an archive file")]
    NoSource,

    /// No destination folder was chosen
    #[error("please choose a destination folder")]
    NoDestination,
}

/// Destination folder access errors, detected before any process is spawned
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Destination does not exist and could not be resolved to a directory
    #[error("destination {path} does not exist")]
    DestinationMissing {
        /// The destination that was expected to exist
        path: PathBuf,
    },

    /// Destination exists (or was created) but cannot be written to
    #[error("destination {path} is not writable: {reason}")]
    DestinationNotWritable {
        /// The destination that was rejected
        path: PathBuf,
        /// Why the write check failed
        reason: String,
    },

    /// A remembered access token no longer resolves
    #[error("destination access token is no longer valid: {reason}")]
    TokenInvalid {
        /// Why the token was rejected
        reason: String,
    },
}

/// Multi-part volume validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A `partNN.rar` set was selected but volume 1 is not on disk
    #[error(
        "missing start volume for {base_name}part1.rar in {}: found parts {parts:?}",
        directory.display()
    )]
    MissingStartVolume {
        /// The shared prefix of the volume set
        base_name: String,
        /// Directory that was scanned
        directory: PathBuf,
        /// Part numbers that were found
        parts: Vec<u64>,
    },

    /// The archive's directory could not be listed
    #[error("cannot read directory {directory}: {reason}")]
    DirectoryUnreadable {
        /// Directory that was scanned
        directory: PathBuf,
        /// The underlying I/O error text
        reason: String,
    },
}

/// The tool ran to completion but reported failure
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Non-zero exit without a more specific diagnosis
    #[error("extraction failed ({tool} exited with code {exit_code})\n{output}")]
    ToolFailed {
        /// The tool whose result decided the outcome
        tool: ToolKind,
        /// Exit code of the process (-1 when terminated by a signal)
        exit_code: i32,
        /// Combined stdout and stderr
        output: String,
    },

    /// Output reported checksum/CRC failures: archive damaged or a volume missing
    #[error("archive {archive} is corrupt or a volume is missing ({tool} exited with code {exit_code})\n{output}")]
    CorruptOrMissingVolume {
        /// The archive that was being extracted
        archive: PathBuf,
        /// The tool whose result decided the outcome
        tool: ToolKind,
        /// Exit code of the process
        exit_code: i32,
        /// Combined stdout and stderr
        output: String,
    },
}

impl Error {
    /// Machine-readable error code for logs and front-ends
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Selection(_) => "selection_error",
            Error::Permission(_) => "permission_error",
            Error::Validation(_) => "validation_error",
            Error::Extract(ExtractError::CorruptOrMissingVolume { .. }) => "corrupt_archive",
            Error::Extract(ExtractError::ToolFailed { .. }) => "tool_failed",
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::ToolMissing { .. } => "tool_missing",
            Error::Spawn { .. } => "spawn_failed",
            Error::Busy => "busy",
            Error::InvalidHandoff(_) => "invalid_handoff",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether this error was raised before any external process was started
    pub fn is_pre_spawn(&self) -> bool {
        !matches!(self, Error::Extract(_) | Error::Spawn { .. })
    }
}
