// crates/flownodes/tests/write_file_test.rs

mod common;

use common::{capture_output, event_bus, failures};
use flowcore::{ErrorKind, Message, Node, Value};
use flownodes::{PathLocks, WriteFileNode, WriteMode};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are UTF-8")
}

#[tokio::test]
async fn test_creates_file_and_forwards_message() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("test_write_file.txt");

    let node = WriteFileNode::new("writer", path_str(&file)).unwrap();
    let capture = capture_output(&node);

    let message = Message::new("Test content").insert_metadata("origin", "test");
    let id = message.id();
    node.on_message(message).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "Test content");
    let forwarded = capture.messages();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].id(), id);
    assert_eq!(forwarded[0].payload_text(), "Test content");
    assert_eq!(forwarded[0].metadata_value("origin"), Some(&Value::from("test")));
}

#[tokio::test]
async fn test_auto_mode_appends_to_existing_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("existing.txt");
    fs::write(&file, "Existing content\n").unwrap();

    let node = WriteFileNode::new("writer", path_str(&file)).unwrap();
    node.on_message(Message::new("New content")).await;

    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "Existing content\nNew content"
    );
}

#[tokio::test]
async fn test_auto_mode_concatenates_a_sequence() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("sequence.txt");

    let node = WriteFileNode::new("writer", path_str(&file)).unwrap();
    for part in ["a", "b", "c"] {
        node.on_message(Message::new(part)).await;
    }

    assert_eq!(fs::read_to_string(&file).unwrap(), "abc");
}

#[tokio::test]
async fn test_null_payload_writes_nothing_but_creates_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("null.txt");

    let node = WriteFileNode::new("writer", path_str(&file)).unwrap();
    let capture = capture_output(&node);
    node.on_message(Message::empty()).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "");
    assert_eq!(capture.len(), 1);
    assert!(capture.messages()[0].payload().is_null());
}

#[tokio::test]
async fn test_creates_missing_parent_directories() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("nested").join("deeper").join("out.txt");

    let node = WriteFileNode::new("writer", path_str(&file)).unwrap();
    node.on_message(Message::new("deep")).await;

    assert!(dir.path().join("nested").join("deeper").is_dir());
    assert_eq!(fs::read_to_string(&file).unwrap(), "deep");
}

#[tokio::test]
async fn test_fixed_append_with_trailing_newline() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("log.txt");

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_append(true)
        .with_trailing_newline(true);
    node.on_message(Message::new("first")).await;
    node.on_message(Message::new("second")).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "first\nsecond\n");
}

#[tokio::test]
async fn test_truncate_keeps_only_last_payload() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("latest.txt");
    fs::write(&file, "stale data that is longer").unwrap();

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_append(false);
    assert_eq!(node.mode(), WriteMode::Truncate);

    node.on_message(Message::new("one")).await;
    node.on_message(Message::new("two")).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "two");
}

#[tokio::test]
async fn test_create_new_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("taken.txt");
    fs::write(&file, "original").unwrap();
    let bus = event_bus();
    let mut rx = bus.subscribe();

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_mode(WriteMode::CreateNew)
        .with_events(bus.create_emitter("writer"));
    let capture = capture_output(&node);

    node.on_message(Message::new("replacement")).await;

    assert_eq!(capture.len(), 0);
    assert_eq!(failures(&mut rx), vec![ErrorKind::AlreadyExists]);
    assert_eq!(fs::read_to_string(&file).unwrap(), "original");
}

#[tokio::test]
async fn test_numeric_and_json_payloads_are_written_as_text() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("values.txt");

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_trailing_newline(true);
    node.on_message(Message::new(42i64)).await;
    node.on_message(Message::new(true)).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "42\ntrue\n");
}

#[tokio::test]
async fn test_two_writers_on_same_path_append() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("shared.txt");

    let first = WriteFileNode::new("first", path_str(&file)).unwrap();
    let second = WriteFileNode::new("second", path_str(&file)).unwrap();

    first.on_message(Message::new("A")).await;
    second.on_message(Message::new("B")).await;
    first.on_message(Message::new("C")).await;

    assert_eq!(fs::read_to_string(&file).unwrap(), "ABC");
}

#[tokio::test]
async fn test_writes_latin1_bytes() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("latin1.txt");

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_encoding_name("latin1")
        .unwrap();
    node.on_message(Message::new("café")).await;

    assert_eq!(fs::read(&file).unwrap(), vec![0x63, 0x61, 0x66, 0xE9]);
}

#[tokio::test]
async fn test_unmappable_character_is_io_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("ascii.txt");
    let bus = event_bus();
    let mut rx = bus.subscribe();

    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_encoding_name("US-ASCII")
        .unwrap()
        .with_events(bus.create_emitter("writer"));
    let capture = capture_output(&node);
    node.on_message(Message::new("naïve")).await;

    assert_eq!(capture.len(), 0);
    assert_eq!(failures(&mut rx), vec![ErrorKind::Io]);
    assert!(!file.exists());
}

#[tokio::test]
async fn test_directory_target_fails_and_node_stays_usable() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("occupied");
    fs::create_dir(&target).unwrap();
    let bus = event_bus();
    let mut rx = bus.subscribe();

    let node = WriteFileNode::new("writer", path_str(&target))
        .unwrap()
        .with_events(bus.create_emitter("writer"));
    let capture = capture_output(&node);
    node.on_message(Message::new("x")).await;

    assert_eq!(capture.len(), 0);
    assert_eq!(failures(&mut rx).len(), 1);

    fs::remove_dir(&target).unwrap();
    node.on_message(Message::new("y")).await;
    assert_eq!(capture.payloads(), vec!["y"]);
    assert_eq!(fs::read_to_string(&target).unwrap(), "y");
}

#[tokio::test]
async fn test_concurrent_writers_sharing_locks_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("concurrent.txt");
    let locks = PathLocks::new();

    let writers: Vec<Arc<WriteFileNode>> = (0..4)
        .map(|i| {
            Arc::new(
                WriteFileNode::new(format!("writer-{}", i), path_str(&file))
                    .unwrap()
                    .with_append(true)
                    .with_trailing_newline(true)
                    .with_path_locks(locks.clone()),
            )
        })
        .collect();

    let mut handles = Vec::new();
    for (i, writer) in writers.iter().enumerate() {
        for n in 0..25 {
            let writer = writer.clone();
            let line = format!("{}-{:02}-{}", i, n, "x".repeat(64));
            handles.push(tokio::spawn(async move {
                writer.on_message(Message::new(line)).await;
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let content = fs::read_to_string(&file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 100);
    assert!(lines.iter().all(|line| line.len() == 69));
    assert_eq!(locks.tracked_paths(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_only_directory_is_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    let file = locked.join("out.txt");

    // Privileged users bypass directory modes.
    let marker = locked.join(".writable");
    if fs::write(&marker, "").is_ok() {
        let _ = fs::remove_file(&marker);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let bus = event_bus();
    let mut rx = bus.subscribe();
    let node = WriteFileNode::new("writer", path_str(&file))
        .unwrap()
        .with_events(bus.create_emitter("writer"));
    let capture = capture_output(&node);

    node.on_message(Message::new("blocked")).await;

    assert_eq!(capture.len(), 0);
    assert_eq!(failures(&mut rx), vec![ErrorKind::PermissionDenied]);
    assert!(!file.exists());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    node.on_message(Message::new("allowed")).await;

    assert!(failures(&mut rx).is_empty());
    assert_eq!(capture.payloads(), vec!["allowed"]);
    assert_eq!(fs::read_to_string(&file).unwrap(), "allowed");
}
