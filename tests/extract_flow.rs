//! End-to-end extraction through real child processes
#![cfg(unix)]

mod common;

use common::Workspace;
use nekorar::{
    Error, Event, ExtractError, Extractor, PermissionError, Selection, StateStore, ToolKind,
    handoff,
};
use serial_test::serial;
use std::path::PathBuf;
use tokio::sync::broadcast;

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn selection(source: PathBuf, destination: PathBuf) -> Selection {
    Selection {
        source: Some(source),
        password: None,
        destination: Some(destination),
    }
}

#[tokio::test]
#[serial]
async fn test_multipart_set_extracts_from_first_volume() {
    let ws = Workspace::new();
    // unrar x -y -p- <src> <dst>: record the source, write a file into dst
    ws.fake_tool(
        "unrar",
        r#"echo "Extracting from $4"
echo "$4" > "$5/source.txt"
echo "All OK""#,
    );
    let first = ws.archive("movie.part01.rar");
    let second = ws.archive("movie.part02.rar");

    let extractor = Extractor::new(ws.config()).expect("Failed to create extractor");
    let mut rx = extractor.subscribe();

    let outcome = extractor
        .extract(selection(second, ws.output()))
        .await
        .expect("extraction should succeed");

    assert!(outcome.succeeded);
    assert_eq!(outcome.tool, ToolKind::Unrar);
    assert!(outcome.combined_output.contains("All OK"));

    let recorded = std::fs::read_to_string(ws.output().join("source.txt")).unwrap();
    assert_eq!(recorded.trim(), first.to_string_lossy());

    match drain(&mut rx).last() {
        Some(Event::Completed {
            succeeded: true,
            destination,
            ..
        }) => assert_eq!(destination.as_deref(), Some(ws.output().as_path())),
        other => panic!("expected successful Completed event, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_unwritable_destination_never_runs_tar() {
    let ws = Workspace::new();
    let marker = ws.root.path().join("tar-ran");
    ws.fake_tool("tar", &format!("touch '{}'", marker.display()));
    let source = ws.archive("movie.tar.gz");

    // A path below a regular file can never become a directory
    let blocker = ws.root.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let extractor = Extractor::new(ws.config()).unwrap();
    let result = extractor
        .extract(selection(source, blocker.join("out")))
        .await;

    assert!(matches!(
        result,
        Err(Error::Permission(
            PermissionError::DestinationNotWritable { .. }
        ))
    ));
    assert!(!marker.exists());
}

#[tokio::test]
#[serial]
async fn test_crc_failure_reports_corrupt_archive() {
    let ws = Workspace::new();
    ws.fake_tool(
        "unrar",
        r#"echo "Extracting  movie.mkv"
echo "movie.mkv - CRC failed" >&2
exit 3"#,
    );
    let source = ws.archive("movie.rar");

    let mut config = ws.config();
    config.tools.rar_fallback = false;
    let extractor = Extractor::new(config).unwrap();
    let mut rx = extractor.subscribe();

    match extractor.extract(selection(source, ws.output())).await {
        Err(Error::Extract(ExtractError::CorruptOrMissingVolume {
            exit_code, output, ..
        })) => {
            assert_eq!(exit_code, 3);
            assert!(output.contains("CRC failed"));
        }
        other => panic!("expected CorruptOrMissingVolume, got {:?}", other),
    }

    match drain(&mut rx).last() {
        Some(Event::Completed {
            succeeded: false,
            message,
            destination: None,
        }) => assert!(message.contains("corrupt or a volume is missing")),
        other => panic!("expected failed Completed event, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_unar_fallback_recovers_failed_rar() {
    let ws = Workspace::new();
    ws.fake_tool("unrar", "echo 'Unsupported compression method' >&2; exit 1");
    // unar -o <dst> -force-overwrite <src>
    ws.fake_tool("unar", r#"echo data > "$2/movie.mkv""#);
    let source = ws.archive("movie.rar");

    let extractor = Extractor::new(ws.config()).unwrap();
    let outcome = extractor
        .extract(selection(source, ws.output()))
        .await
        .expect("fallback should recover");

    assert!(outcome.used_fallback);
    assert_eq!(outcome.tool, ToolKind::Unar);
    assert!(ws.output().join("movie.mkv").is_file());
}

#[tokio::test]
#[serial]
async fn test_forwarded_file_is_extracted_into_remembered_destination() {
    let ws = Workspace::new();
    ws.fake_tool("7za", "exit 0");
    let source = ws.archive("photos.zip");
    std::fs::create_dir(ws.output()).unwrap();

    let config = ws.config();
    let store = StateStore::new(config.state.resolved_path());
    let extractor = Extractor::new(config).unwrap();

    let url = format!("file://{}", source.display());
    handoff::forward(&store, &url).unwrap();
    store
        .remember_destination(extractor.access().as_ref(), &ws.output())
        .unwrap();

    let file = handoff::launch_file(&store, None).unwrap();
    let destination = store
        .restore_destination(extractor.access().as_ref())
        .unwrap();
    assert_eq!(file.as_deref(), Some(source.as_path()));

    let outcome = extractor
        .extract(Selection {
            source: file,
            password: None,
            destination,
        })
        .await
        .unwrap();
    assert_eq!(outcome.tool, ToolKind::SevenZip);
    assert_eq!(handoff::launch_file(&store, None).unwrap(), None);
}
