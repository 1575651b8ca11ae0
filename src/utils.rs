//! Utility functions

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::time::SystemTime;

/// Check that `dir` is a directory the current process may create files in
///
/// Uses platform-specific APIs:
/// - Unix: `access(2)` with `W_OK | X_OK`
/// - other: the read-only permission bit
///
/// # Examples
///
/// ```ignore
/// check_writable(Path::new("/downloads"))?;
/// ```
pub fn check_writable(dir: &Path) -> std::io::Result<()> {
    let metadata = std::fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            "not a directory",
        ));
    }

    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(dir.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is a valid, null-terminated C string that outlives the
        // call, and access(2) does not retain the pointer
        let rc = unsafe { libc::access(c_path.as_ptr(), libc::W_OK | libc::X_OK) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        if metadata.permissions().readonly() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "directory is read-only",
            ));
        }
        Ok(())
    }
}

/// Top-level entries of a directory with their modification times
pub type DirSnapshot = HashMap<OsString, Option<SystemTime>>;

/// Record the top-level entries of `dir`
///
/// A missing or unreadable directory yields an empty snapshot.
pub fn snapshot_entries(dir: &Path) -> DirSnapshot {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return DirSnapshot::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| {
            let modified = e.metadata().ok().and_then(|m| m.modified().ok());
            (e.file_name(), modified)
        })
        .collect()
}

/// Whether `dir` gained an entry, or an existing entry changed, since `before`
pub fn has_new_entries(before: &DirSnapshot, dir: &Path) -> bool {
    snapshot_entries(dir)
        .into_iter()
        .any(|(name, modified)| match before.get(&name) {
            None => true,
            Some(previous) => modified.is_some() && *previous != modified,
        })
}

/// Open `path` in the platform file manager without waiting for it
///
/// Failures are logged and otherwise ignored.
pub fn reveal_in_file_manager(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    };

    match spawn_detached(Path::new(opener), path) {
        Ok(()) => tracing::debug!(?path, opener, "opened destination"),
        Err(e) => tracing::warn!(?path, opener, error = %e, "could not open destination"),
    }
}

/// Start `program path` and reap it on a background thread
fn spawn_detached(program: &Path, path: &Path) -> std::io::Result<()> {
    let mut child = std::process::Command::new(program)
        .arg(path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;

    std::thread::Builder::new()
        .name("nekorar-reveal".to_string())
        .spawn(move || {
            if let Err(e) = child.wait() {
                tracing::debug!(error = %e, "file manager process could not be reaped");
            }
        })?;
    Ok(())
}
