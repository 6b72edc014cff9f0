//! Command table integration tests
//!
//! Loading, fallback to the embedded table and background reload

use std::sync::Arc;
use std::time::Duration;

use hark::commands::spawn_reloader;
use hark::{Category, CommandStore, CommandTable};

mod common;
use common::{ASSISTANT, MASTER};

const CUSTOM: &str = r#"{"command_db": [
    {"name": "wakeup", "commands": ["yo <assistant_name>"]},
    {"name": "wakeup_responses", "commands": ["At your service, <boss_name>."]}
]}"#;

#[test]
fn test_embedded_table_has_every_category() {
    let table = CommandTable::embedded(ASSISTANT, MASTER).unwrap();

    for category in Category::ALL {
        assert!(
            !table.phrases(category).is_empty(),
            "missing phrases for {category}"
        );
    }
    assert!(table.phrases(Category::Wakeup).contains(&"hey Jarvis".to_string()));
}

#[test]
fn test_missing_file_falls_back_to_embedded() {
    let dir = tempfile::tempdir().unwrap();
    let table =
        CommandTable::load_or_embedded(&dir.path().join("commands_db.json"), ASSISTANT, MASTER)
            .unwrap();

    assert_eq!(table, CommandTable::embedded(ASSISTANT, MASTER).unwrap());
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands_db.json");
    std::fs::write(&path, "{ nope").unwrap();

    assert!(CommandTable::load_or_embedded(&path, ASSISTANT, MASTER).is_err());
}

#[tokio::test]
async fn test_reloader_swaps_in_edited_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands_db.json");
    let store = CommandStore::new(CommandTable::embedded(ASSISTANT, MASTER).unwrap());
    let mut updates = store.subscribe();
    spawn_reloader(store.clone(), path.clone(), ASSISTANT.into(), MASTER.into());

    std::fs::write(&path, CUSTOM).unwrap();
    store.request_reload();
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("reload within timeout")
        .unwrap();

    let table = store.snapshot();
    assert_eq!(table.phrases(Category::Wakeup), ["yo Jarvis"]);
    assert_eq!(
        table.phrases(Category::WakeupResponses),
        ["At your service, Tony."]
    );
}

#[tokio::test]
async fn test_unchanged_file_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands_db.json");
    std::fs::write(&path, CUSTOM).unwrap();
    let store = CommandStore::new(CommandTable::parse(CUSTOM, ASSISTANT, MASTER).unwrap());
    let before = store.snapshot();

    assert!(!store.reload_from(&path, ASSISTANT, MASTER));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}
