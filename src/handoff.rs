//! Handing an archive over from another process
//!
//! A file-manager action or share extension receives a file URL and cannot
//! extract it itself. It forwards the file through the state store; the next
//! run of the main program picks it up as if it had been passed on the command
//! line.

use crate::error::{Error, Result};
use crate::state::StateStore;
use std::path::PathBuf;
use tracing::info;
use url::Url;

/// Turn a forwarded item into a local path
///
/// Accepts `file://` URLs (percent-decoded) and plain paths. Other URL schemes
/// are rejected.
pub fn parse_item(item: &str) -> Result<PathBuf> {
    let item = item.trim();
    if item.is_empty() {
        return Err(Error::InvalidHandoff("empty file reference".to_string()));
    }

    match Url::parse(item) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| Error::InvalidHandoff(format!("not a local file URL: {}", item))),
        // Windows drive letters parse as a one-letter scheme
        Ok(url) if url.scheme().len() > 1 => Err(Error::InvalidHandoff(format!(
            "unsupported URL scheme '{}'",
            url.scheme()
        ))),
        _ => Ok(PathBuf::from(item)),
    }
}

/// Record a forwarded item as the pending launch file
pub fn forward(store: &StateStore, item: &str) -> Result<PathBuf> {
    let path = parse_item(item)?;
    store.set_launch_file(&path)?;
    info!(?path, "archive forwarded to main program");
    Ok(path)
}

/// The archive to open at startup
///
/// An explicit launch argument wins; otherwise a pending forwarded file is
/// taken from the store (and cleared).
pub fn launch_file(store: &StateStore, argument: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if argument.is_some() {
        return Ok(argument);
    }
    store.take_launch_file()
}
