//! File-based list import: file names become list ids, directories carry types.

use std::fs;

use sift_core::FieldValue;
use sift_lists::{ListError, ListStore, ListType, LoadStatus};
use tempfile::TempDir;

#[test]
fn import_file_uses_file_name_as_id() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("list_items.txt");
    fs::write(&path, "word one\nword six\n").unwrap();

    let store = ListStore::new();
    let list = store.import_file(&path, ListType::Keyword).unwrap();

    assert_eq!(list.id, "list_items.txt");
    assert_eq!(list.len(), 2);
    assert!(store.get("list_items.txt").is_some());
}

#[test]
fn load_dir_reads_typed_subdirectories() {
    let dir = TempDir::new().expect("create tempdir");
    fs::create_dir(dir.path().join("keyword")).unwrap();
    fs::create_dir(dir.path().join("ip")).unwrap();
    fs::create_dir(dir.path().join("not_a_type")).unwrap();

    fs::write(dir.path().join("keyword/words.txt"), "word one\n").unwrap();
    fs::write(dir.path().join("keyword/.hidden"), "ignored\n").unwrap();
    fs::write(dir.path().join("ip/blocked.txt"), "10.0.0.1\n::1\n").unwrap();
    fs::write(dir.path().join("not_a_type/x.txt"), "x\n").unwrap();

    let store = ListStore::new();
    let results = store.load_dir(dir.path()).unwrap();

    let loaded = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Loaded { .. }))
        .count();
    let skipped = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Skipped { .. }))
        .count();
    assert_eq!(loaded, 2);
    assert_eq!(skipped, 2, "{results:?}");
    assert_eq!(store.ids(), vec!["blocked.txt".to_string(), "words.txt".to_string()]);

    let snapshot = store.snapshot();
    let blocked = snapshot.resolve("blocked.txt", ListType::Ip).unwrap();
    assert!(blocked.contains(&FieldValue::Text("0:0:0:0:0:0:0:1".into())));
}

#[test]
fn load_dir_missing_directory_is_empty() {
    let dir = TempDir::new().expect("create tempdir");
    let store = ListStore::new();
    let results = store.load_dir(&dir.path().join("nope")).unwrap();
    assert!(results.is_empty());
}

#[test]
fn import_missing_file_is_io_error() {
    let dir = TempDir::new().expect("create tempdir");
    let store = ListStore::new();
    let err = store
        .import_file(&dir.path().join("absent.txt"), ListType::Keyword)
        .unwrap_err();
    assert!(matches!(err, ListError::Io(_)));
}

#[test]
fn load_dir_skips_bad_file_and_keeps_going() {
    let dir = TempDir::new().expect("create tempdir");
    fs::create_dir(dir.path().join("ip")).unwrap();
    fs::create_dir(dir.path().join("keyword")).unwrap();
    fs::write(dir.path().join("ip/bad.txt"), "not-an-ip\n").unwrap();
    fs::write(dir.path().join("keyword/words.txt"), "word one\n").unwrap();

    let store = ListStore::new();
    let results = store.load_dir(dir.path()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].path, dir.path().join("ip/bad.txt"));
    match &results[0].status {
        LoadStatus::Failed { error } => assert!(error.contains("not-an-ip"), "{error}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(
        results[1].status,
        LoadStatus::Loaded {
            list_id: "words.txt".to_string(),
            list_type: ListType::Keyword,
            items: 1,
        }
    );
    assert_eq!(store.ids(), vec!["words.txt".to_string()]);
}

#[test]
fn load_dir_same_name_later_type_wins() {
    let dir = TempDir::new().expect("create tempdir");
    fs::create_dir(dir.path().join("ip")).unwrap();
    fs::create_dir(dir.path().join("keyword")).unwrap();
    fs::write(dir.path().join("ip/hosts.txt"), "10.0.0.1\n").unwrap();
    fs::write(dir.path().join("keyword/hosts.txt"), "web-1\n").unwrap();

    let store = ListStore::new();
    store.load_dir(dir.path()).unwrap();

    let hosts = store.get("hosts.txt").unwrap();
    assert_eq!(hosts.list_type, ListType::Keyword);
    assert!(hosts.contains_raw("web-1"));
}
