//! Integration tests for the JSON file store and command handlers.
//!
//! Runs the collection against a real notes file in a temp directory.

use chrono::{TimeZone, Utc};
use notes_cli::commands;
use notes_cli::JsonFileStore;
use notes_core::storage::{NoteStorage, StorageError};
use notes_core::{CollectionError, LoadOutcome, Note, NoteCollection, NoteId};
use tempfile::TempDir;

fn sample(content: &str, year: i32) -> Note {
    let at = Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap();
    Note::from_parts(NoteId::new(), content, at, at)
}

fn store_in(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().join("Notes").join("notes.json"))
}

#[tokio::test]
async fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let notes = vec![sample("First\nbody", 2024), sample("Second", 2023)];

    store.save_all(&notes).await.unwrap();
    assert_eq!(store.load_all().await.unwrap(), notes);

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"lastModifiedDate\""));
    assert!(!raw.contains("\"title\""));
    assert!(!dir.path().join("Notes").join("notes.json.tmp").exists());
}

#[tokio::test]
async fn test_corrupt_file_is_kept_aside() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), b"{ this is not json").unwrap();

    let result = store.load_all().await;
    assert!(matches!(result, Err(StorageError::Malformed(_))));
    let kept = std::fs::read(store.corrupt_path()).unwrap();
    assert_eq!(kept, b"{ this is not json");
}

#[tokio::test]
async fn test_collection_recovers_from_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
    std::fs::write(store.path(), b"[[[").unwrap();
    let corrupt_path = store.corrupt_path();

    let mut collection = NoteCollection::new(store);
    let outcome = collection.load().await;
    assert!(matches!(outcome, LoadOutcome::Recovered(StorageError::Malformed(_))));
    assert!(collection.is_empty());

    collection.add_note().await.unwrap();
    assert!(corrupt_path.exists());
}

#[tokio::test]
async fn test_import_reads_desktop_app_backup() {
    let dir = TempDir::new().unwrap();
    let backup = dir.path().join("Notes_backup_20240101.json");
    std::fs::write(
        &backup,
        r#"[
  {
    "Id": "0b5f8a52-3c1e-4d8a-9f3b-2e6c7d8e9f01",
    "Content": "Trip\npack bags",
    "CreatedDate": "2023-12-30T20:15:00+08:00",
    "LastModifiedDate": "2023-12-31T09:00:00+08:00"
  }
]"#,
    )
    .unwrap();

    let mut collection = NoteCollection::new(store_in(&dir));
    collection.load().await;
    let report = collection
        .import_from(&backup.to_string_lossy())
        .await
        .unwrap();
    assert_eq!(report.added_count, 1);

    let note = &collection.notes()[0];
    assert_eq!(note.title(), "Trip");
    assert_eq!(note.preview(), "pack bags");
}

#[tokio::test]
async fn test_import_missing_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let mut collection = NoteCollection::new(store_in(&dir));
    collection.load().await;

    let missing = dir.path().join("nope.json");
    let result = collection.import_from(&missing.to_string_lossy()).await;
    assert!(matches!(
        result,
        Err(CollectionError::Storage(StorageError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn test_commands_end_to_end() {
    let dir = TempDir::new().unwrap();
    let mut collection = NoteCollection::new(store_in(&dir));
    collection.load().await;
    let mut out = Vec::new();

    commands::add(&mut collection, Some("Groceries\r\nmilk\r\neggs"), &mut out)
        .await
        .unwrap();
    let id = collection.selected_id().unwrap();
    assert_eq!(collection.note(id).unwrap().content(), "Groceries\nmilk\neggs");

    let prefix = id.short();
    commands::edit(&mut collection, &prefix, "Groceries\nmilk", &mut out)
        .await
        .unwrap();

    out.clear();
    commands::list(&mut collection, Some("GROCERIES"), false, &mut out).unwrap();
    let listing = String::from_utf8(out.clone()).unwrap();
    assert!(listing.contains("Groceries - milk"));

    let export_path = dir.path().join("backup").join("export.json");
    commands::export(&collection, &export_path.to_string_lossy(), &mut out)
        .await
        .unwrap();

    commands::delete(&mut collection, &prefix, &mut out).await.unwrap();
    collection.flush().await;
    assert!(collection.is_empty());

    // Reload from disk and restore from the export
    let mut reloaded = NoteCollection::new(store_in(&dir));
    reloaded.load().await;
    assert!(reloaded.is_empty());

    out.clear();
    commands::import(&mut reloaded, &export_path.to_string_lossy(), &mut out)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Imported 1 new note(s) (skipped 0 duplicate(s))\n"
    );
    assert_eq!(reloaded.note(id).unwrap().content(), "Groceries\nmilk");
}

#[tokio::test]
async fn test_import_command_reports_rejected_file() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.save_all(&[sample("kept", 2024)]).await.unwrap();
    let bad = dir.path().join("broken.json");
    std::fs::write(&bad, b"{ not a note list").unwrap();

    let mut collection = NoteCollection::new(store);
    collection.load().await;
    let mut out = Vec::new();

    let err = commands::import(&mut collection, &bad.to_string_lossy(), &mut out)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CollectionError>(),
        Some(CollectionError::ImportMalformed(_))
    ));

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with("Imported 0 new note(s) (skipped 0 duplicate(s))\n"));
    assert!(printed.contains("Rejected"));
    assert_eq!(collection.len(), 1);
}

#[tokio::test]
async fn test_resolve_id_errors() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store
        .save_all(&[sample("one", 2024), sample("two", 2024)])
        .await
        .unwrap();

    let mut collection = NoteCollection::new(store);
    collection.load().await;

    let err = commands::resolve_id(&collection, "zzzz").unwrap_err();
    assert!(err.to_string().contains("No note matches"));

    // Empty prefix never matches
    assert!(commands::resolve_id(&collection, "").is_err());
}
