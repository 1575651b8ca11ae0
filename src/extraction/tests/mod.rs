use crate::error::{Error, ValidationError};
use crate::extraction::*;
use crate::tools::ProcessOutput;
use crate::types::{ArchiveKind, ArchiveRequest, OutcomeStatus, ToolKind};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn markers() -> Vec<String> {
    vec!["checksum error".to_string(), "crc failed".to_string()]
}

fn output(exit_code: i32, combined: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code,
        combined: combined.to_string(),
    }
}

fn args(invocation: &ToolInvocation) -> Vec<String> {
    invocation
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

/// Create empty files with the given names in `dir`
fn touch_all(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"").unwrap();
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn test_classify_single_extensions() {
    let cases = [
        ("movie.rar", ArchiveKind::Rar),
        ("movie.part01.rar", ArchiveKind::Rar),
        ("photos.zip", ArchiveKind::Zip),
        ("backup.7z", ArchiveKind::SevenZip),
        ("src.tgz", ArchiveKind::TarGz),
        ("src.tbz", ArchiveKind::TarBz2),
        ("src.tar", ArchiveKind::Tar),
    ];
    for (name, expected) in cases {
        assert_eq!(classify(Path::new(name)), expected, "{}", name);
    }
}

#[test]
fn test_classify_is_case_insensitive() {
    assert_eq!(classify(Path::new("MOVIE.RAR")), ArchiveKind::Rar);
    assert_eq!(classify(Path::new("Photos.Zip")), ArchiveKind::Zip);
    assert_eq!(classify(Path::new("Backup.TAR.GZ")), ArchiveKind::TarGz);
    assert_eq!(classify(Path::new("Backup.Tar.Bz2")), ArchiveKind::TarBz2);
}

#[test]
fn test_classify_two_part_suffixes() {
    assert_eq!(classify(Path::new("/tmp/movie.tar.gz")), ArchiveKind::TarGz);
    assert_eq!(classify(Path::new("/tmp/movie.tar.bz2")), ArchiveKind::TarBz2);
}

#[test]
fn test_classify_unsupported() {
    for name in ["notes.txt", "movie.gz", "movie.bz2", "README", "archive.r00", ""] {
        assert_eq!(
            classify(Path::new(name)),
            ArchiveKind::Unsupported,
            "{:?}",
            name
        );
    }
}

// ---------------------------------------------------------------------------
// Tool invocations
// ---------------------------------------------------------------------------

#[test]
fn test_unrar_without_password_disables_prompt() {
    let request = ArchiveRequest::new("/dl/movie.rar", "/out", None);
    let invocation = plan(ArchiveKind::Rar, &request).unwrap();

    assert_eq!(invocation.tool, ToolKind::Unrar);
    assert_eq!(args(&invocation), ["x", "-y", "-p-", "/dl/movie.rar", "/out"]);
}

#[test]
fn test_unrar_with_password() {
    let request = ArchiveRequest::new("/dl/movie.rar", "/out", Some("s3cret".to_string()));
    let invocation = plan(ArchiveKind::Rar, &request).unwrap();

    assert_eq!(args(&invocation), ["x", "-y", "-ps3cret", "/dl/movie.rar", "/out"]);
}

#[test]
fn test_sevenzip_for_zip_and_7z() {
    let request = ArchiveRequest::new("/dl/photos.zip", "/out", None);
    for kind in [ArchiveKind::Zip, ArchiveKind::SevenZip] {
        let invocation = plan(kind, &request).unwrap();
        assert_eq!(invocation.tool, ToolKind::SevenZip);
        assert_eq!(args(&invocation), ["x", "-y", "/dl/photos.zip", "-o/out"]);
    }
}

#[test]
fn test_sevenzip_password_precedes_source() {
    let request = ArchiveRequest::new("/dl/backup.7z", "/out", Some("pw".to_string()));
    let invocation = plan(ArchiveKind::SevenZip, &request).unwrap();

    assert_eq!(args(&invocation), ["x", "-y", "-ppw", "/dl/backup.7z", "-o/out"]);
}

#[test]
fn test_tar_modes() {
    let request = ArchiveRequest::new("/dl/src.tar.gz", "/out", Some("ignored".to_string()));
    let cases = [
        (ArchiveKind::TarGz, "-xzf"),
        (ArchiveKind::TarBz2, "-xjf"),
        (ArchiveKind::Tar, "-xf"),
    ];
    for (kind, mode) in cases {
        let invocation = plan(kind, &request).unwrap();
        assert_eq!(invocation.tool, ToolKind::Tar);
        assert_eq!(args(&invocation), [mode, "/dl/src.tar.gz", "-C", "/out"]);
    }
}

#[test]
fn test_unsupported_has_no_plan() {
    let request = ArchiveRequest::new("/dl/notes.txt", "/out", None);
    assert!(plan(ArchiveKind::Unsupported, &request).is_none());
}

#[test]
fn test_fallback_plan_for_unar() {
    let request = ArchiveRequest::new("/dl/movie.rar", "/out", None);
    let invocation = fallback_plan(&request);
    assert_eq!(invocation.tool, ToolKind::Unar);
    assert_eq!(
        args(&invocation),
        ["-o", "/out", "-force-overwrite", "/dl/movie.rar"]
    );

    let request = request.with_source(Path::new("/dl/movie.part1.rar"));
    let request = ArchiveRequest {
        password: Some("pw".to_string()),
        ..request
    };
    assert_eq!(
        args(&fallback_plan(&request)),
        ["-o", "/out", "-force-overwrite", "-p", "pw", "/dl/movie.part1.rar"]
    );
}

#[test]
fn test_paths_with_spaces_stay_single_arguments() {
    let request = ArchiveRequest::new("/My Downloads/a b.zip", "/My Out", None);
    let invocation = plan(ArchiveKind::Zip, &request).unwrap();
    assert_eq!(invocation.args[2], OsString::from("/My Downloads/a b.zip"));
    assert_eq!(invocation.args[3], OsString::from("-o/My Out"));
}

// ---------------------------------------------------------------------------
// Multi-part validation
// ---------------------------------------------------------------------------

#[test]
fn test_is_multipart_volume() {
    assert!(is_multipart_volume("movie.part1.rar"));
    assert!(is_multipart_volume("Movie.PART001.RAR"));
    assert!(is_multipart_volume("movie.part10.rar"));
    assert!(!is_multipart_volume("movie.rar"));
    assert!(!is_multipart_volume("movie.r00"));
    assert!(!is_multipart_volume("movie.part1.zip"));
}

#[test]
fn test_single_rar_passes_without_scan() {
    let dir = TempDir::new().unwrap();
    touch_all(dir.path(), &["movie.rar"]);

    let check = validate_volumes(&dir.path().join("movie.rar")).unwrap();
    assert_eq!(check, VolumeCheck::Single);
}

#[test]
fn test_missing_first_volume_is_rejected() {
    let dir = TempDir::new().unwrap();
    touch_all(dir.path(), &["movie.part02.rar", "movie.part03.rar"]);

    match validate_volumes(&dir.path().join("movie.part03.rar")) {
        Err(Error::Validation(ValidationError::MissingStartVolume {
            base_name,
            directory,
            parts,
        })) => {
            assert_eq!(base_name, "movie.");
            assert_eq!(directory, dir.path());
            assert_eq!(parts, vec![2, 3]);
        }
        other => panic!("expected MissingStartVolume, got {:?}", other),
    }
}

#[test]
fn test_complete_set_is_accepted_from_any_volume() {
    let dir = TempDir::new().unwrap();
    touch_all(
        dir.path(),
        &["movie.part01.rar", "movie.part02.rar", "movie.part03.rar"],
    );

    let VolumeCheck::Multipart(set) = validate_volumes(&dir.path().join("movie.part03.rar"))
        .unwrap()
    else {
        panic!("expected a multi-part set");
    };

    assert!(set.has_part_one);
    assert_eq!(set.member_paths.len(), 3);
    assert_eq!(set.part_numbers.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
    assert_eq!(set.first_volume(), Some(dir.path().join("movie.part01.rar").as_path()));
}

#[test]
fn test_leading_zeros_are_ignored() {
    let dir = TempDir::new().unwrap();
    touch_all(dir.path(), &["show.part001.rar", "show.part002.rar"]);

    let set = scan_volumes(&dir.path().join("show.part002.rar"))
        .unwrap()
        .unwrap();
    assert!(set.has_part_one);
    assert_eq!(set.base_name, "show.");
}

#[test]
fn test_other_sets_with_shared_prefix_are_excluded() {
    let dir = TempDir::new().unwrap();
    touch_all(
        dir.path(),
        &[
            "movie.part02.rar",
            "movie.sample.part1.rar",
            "movie.part1.zip",
            "other.part1.rar",
        ],
    );

    let result = validate_volumes(&dir.path().join("movie.part02.rar"));
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::MissingStartVolume { ref parts, .. })) if parts == &vec![2]
    ));
}

#[test]
fn test_volume_match_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    touch_all(dir.path(), &["Movie.Part1.RAR", "movie.part2.rar"]);

    let set = scan_volumes(&dir.path().join("movie.part2.rar"))
        .unwrap()
        .unwrap();
    assert!(set.has_part_one);
    assert_eq!(set.member_paths.len(), 2);
}

#[test]
fn test_unreadable_directory_is_a_validation_error() {
    let result = validate_volumes(Path::new("/nonexistent/nekorar/movie.part2.rar"));
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::DirectoryUnreadable { .. }))
    ));
}

#[test]
fn test_prepare_rejects_unsupported_before_anything_else() {
    let request = ArchiveRequest::new("/nonexistent/notes.txt", "/nonexistent/out", None);
    assert!(matches!(
        prepare(&request),
        Err(Error::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_prepare_points_tool_at_first_volume() {
    let dir = TempDir::new().unwrap();
    touch_all(dir.path(), &["movie.part1.rar", "movie.part2.rar"]);
    let request = ArchiveRequest::new(dir.path().join("movie.part2.rar"), "/out", None);

    let plan = prepare(&request).unwrap();
    assert_eq!(plan.kind, ArchiveKind::Rar);
    assert_eq!(plan.request.source, dir.path().join("movie.part1.rar"));
    assert_eq!(
        plan.invocation.args[3],
        dir.path().join("movie.part1.rar").into_os_string()
    );
    assert!(plan.volumes.is_some());
}

#[test]
fn test_prepare_single_rar_keeps_source() {
    let request = ArchiveRequest::new(PathBuf::from("/dl/movie.rar"), "/out", None);
    let plan = prepare(&request).unwrap();
    assert_eq!(plan.request, request);
    assert!(plan.volumes.is_none());
}

// ---------------------------------------------------------------------------
// Outcome classification
// ---------------------------------------------------------------------------

#[test]
fn test_exit_zero_is_success_even_with_markers() {
    let status = classify_output(ArchiveKind::Rar, &output(0, "CRC failed? no, All OK"), &markers());
    assert_eq!(status, OutcomeStatus::Success);
}

#[test]
fn test_rar_markers_mean_corruption() {
    for text in ["movie.mkv - CRC failed", "Checksum error in movie.part2.rar"] {
        assert_eq!(
            classify_output(ArchiveKind::Rar, &output(3, text), &markers()),
            OutcomeStatus::CorruptOrMissingVolume,
            "{}",
            text
        );
    }
}

#[test]
fn test_markers_only_apply_to_rar() {
    let status = classify_output(ArchiveKind::Zip, &output(2, "CRC Failed : a.jpg"), &markers());
    assert_eq!(status, OutcomeStatus::Failed);
}

#[test]
fn test_rar_failure_without_markers_is_generic() {
    let status = classify_output(ArchiveKind::Rar, &output(10, "No files to extract"), &markers());
    assert_eq!(status, OutcomeStatus::Failed);
}

#[test]
fn test_blank_markers_never_match() {
    assert!(!detects_corruption("anything", &["".to_string(), "  ".to_string()]));
}

#[test]
fn test_outcome_error_conversion() {
    let ok = outcome_from_output(ArchiveKind::Tar, ToolKind::Tar, output(0, ""), &markers());
    assert!(ok.succeeded);
    assert!(outcome_error(&ok, Path::new("a.tar")).is_none());

    let failed = outcome_from_output(
        ArchiveKind::Rar,
        ToolKind::Unrar,
        output(3, "CRC failed in movie.mkv"),
        &markers(),
    );
    assert!(!failed.succeeded);
    assert!(!failed.used_fallback);
    let err = outcome_error(&failed, Path::new("movie.rar")).unwrap();
    assert_eq!(err.code(), "corrupt_archive");
    assert!(err.to_string().contains("CRC failed in movie.mkv"));
}
