//! Multi-part RAR volume set validation.
//!
//! Only the new-style naming (`name.part01.rar`, `name.part2.rar`, ...) is
//! checked. The extractor needs volume one on disk to find the archive's
//! headers, so a set without it is rejected before any process is started.

use crate::error::{Result, ValidationError};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

fn part_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^(?P<base>.*)part0*(?P<num>\d+)\.rar$").expect("static regex is valid")
    })
}

/// Split a lowercase file name into its volume prefix and part number
///
/// `movie.part03.rar` → `("movie.", 3)`. Returns `None` for names that are not
/// `partNN.rar` volumes or whose number does not fit in a `u64`.
fn split_volume_name(lower_name: &str) -> Option<(&str, u64)> {
    let caps = part_pattern().captures(lower_name)?;
    let base = caps.name("base")?.as_str();
    let number = caps.name("num")?.as_str().parse::<u64>().ok()?;
    Some((base, number))
}

fn archive_directory(archive: &Path) -> PathBuf {
    match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether a file name looks like a `partNN.rar` volume
pub fn is_multipart_volume(filename: &str) -> bool {
    split_volume_name(&filename.to_lowercase()).is_some()
}

/// A `partNN.rar` volume set found next to the selected file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartSet {
    /// Shared lowercase prefix (e.g. `movie.` for `movie.part01.rar`)
    pub base_name: String,
    /// Volumes in the directory, sorted by file name
    pub member_paths: Vec<PathBuf>,
    /// Whether volume one is among them
    pub has_part_one: bool,
    /// Part numbers found
    pub part_numbers: BTreeSet<u64>,
}

impl MultipartSet {
    /// Path of volume one, if present
    pub fn first_volume(&self) -> Option<&Path> {
        self.member_paths
            .iter()
            .find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| split_volume_name(&n.to_lowercase()).map(|(_, num)| num))
                    == Some(1)
            })
            .map(PathBuf::as_path)
    }
}

/// Result of checking the selected RAR file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeCheck {
    /// Not a `partNN.rar` name; extract as-is
    Single,
    /// Complete enough to extract (volume one present)
    Multipart(MultipartSet),
}

/// Scan the directory around `archive` for its sibling volumes
///
/// Returns `Ok(None)` when the file name is not a `partNN.rar` volume.
pub fn scan_volumes(archive: &Path) -> Result<Option<MultipartSet>> {
    let Some(name) = archive.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let lower = name.to_lowercase();
    let Some((base, _)) = split_volume_name(&lower) else {
        return Ok(None);
    };

    let directory = archive_directory(archive);
    let entries = std::fs::read_dir(&directory).map_err(|e| {
        warn!(?directory, error = %e, "cannot list archive directory");
        ValidationError::DirectoryUnreadable {
            directory: directory.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut members = Vec::new();
    let mut part_numbers = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| ValidationError::DirectoryUnreadable {
            directory: directory.clone(),
            reason: e.to_string(),
        })?;
        let entry_name = entry.file_name();
        let Some(entry_lower) = entry_name.to_str().map(str::to_lowercase) else {
            continue;
        };
        if !entry_lower.starts_with(base) || !entry_lower.ends_with(".rar") {
            continue;
        }
        // A longer name like "movie.sample.part1.rar" also starts with "movie."
        // but belongs to a different set
        match split_volume_name(&entry_lower) {
            Some((entry_base, number)) if entry_base == base => {
                part_numbers.insert(number);
                members.push(entry.path());
            }
            _ => continue,
        }
    }
    members.sort();

    let has_part_one = part_numbers.contains(&1);
    debug!(
        ?archive,
        base,
        volumes = members.len(),
        has_part_one,
        "scanned multi-part volume set"
    );

    Ok(Some(MultipartSet {
        base_name: base.to_string(),
        member_paths: members,
        has_part_one,
        part_numbers,
    }))
}

/// Check that a selected RAR file can be extracted
///
/// Single-volume names pass unconditionally. For a `partNN.rar` name the
/// directory must contain volume one of the same set; otherwise the request is
/// rejected with [`ValidationError::MissingStartVolume`].
pub fn validate_volumes(archive: &Path) -> Result<VolumeCheck> {
    let Some(set) = scan_volumes(archive)? else {
        return Ok(VolumeCheck::Single);
    };

    if !set.has_part_one {
        let directory = archive_directory(archive);
        warn!(
            ?archive,
            base = %set.base_name,
            parts = ?set.part_numbers,
            "multi-part archive is missing its first volume"
        );
        return Err(ValidationError::MissingStartVolume {
            base_name: set.base_name,
            directory,
            parts: set.part_numbers.into_iter().collect(),
        }
        .into());
    }

    Ok(VolumeCheck::Multipart(set))
}
