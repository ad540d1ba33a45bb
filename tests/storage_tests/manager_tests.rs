//! Tests for StorageCore
//!
//! These tests verify:
//! - Opening/creating the data directory and database 0
//! - Lazy database creation by id
//! - Startup recovery across restarts

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use lodekv::storage::DEFAULT_DATABASE;
use lodekv::{Config, Database, StorageCore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data");
    (temp_dir, path)
}

fn config_for(dir: &PathBuf) -> Config {
    Config::builder().data_dir(dir).build()
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory_and_default_database() {
    let (_temp, dir) = setup_temp_storage();
    let core = StorageCore::open(&config_for(&dir)).unwrap();

    assert!(dir.is_dir());
    assert_eq!(core.database_ids(), vec![DEFAULT_DATABASE]);
    assert_eq!(core.data_dir(), dir.as_path());
    assert!(core.default_database().unwrap().is_journaled());
    assert!(dir.join(Database::log_file_name(0)).exists());
}

#[test]
fn test_database_created_on_first_reference() {
    let (_temp, dir) = setup_temp_storage();
    let core = StorageCore::open(&config_for(&dir)).unwrap();

    assert!(core.get(5).is_none());
    let db = core.database(5).unwrap();
    assert_eq!(db.id(), 5);
    assert!(Arc::ptr_eq(&db, &core.database(5).unwrap()));
    assert_eq!(core.database_ids(), vec![0, 5]);
}

#[test]
fn test_databases_are_isolated() {
    let (_temp, dir) = setup_temp_storage();
    let core = StorageCore::open(&config_for(&dir)).unwrap();

    core.database(0).unwrap().set("k", "zero").unwrap();
    core.database(1).unwrap().set("k", "one").unwrap();

    assert_eq!(core.database(0).unwrap().get("k").unwrap().data().as_ref(), b"zero");
    assert_eq!(core.database(1).unwrap().get("k").unwrap().data().as_ref(), b"one");
}

#[test]
fn test_concurrent_creation_yields_one_database() {
    let (_temp, dir) = setup_temp_storage();
    let core = Arc::new(StorageCore::open(&config_for(&dir)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let core = Arc::clone(&core);
            thread::spawn(move || core.database(7).unwrap())
        })
        .collect();
    let dbs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for db in &dbs[1..] {
        assert!(Arc::ptr_eq(&dbs[0], db));
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_startup_recovery_restores_state() {
    let (_temp, dir) = setup_temp_storage();
    {
        let core = StorageCore::open(&config_for(&dir)).unwrap();
        let db = core.default_database().unwrap();
        db.set("hello", "world").unwrap();
        db.list_insert("item").unwrap();
    }

    let core = StorageCore::open(&config_for(&dir)).unwrap();
    let db = core.default_database().unwrap();
    assert_eq!(db.get("hello").unwrap().data().as_ref(), b"world");
    assert_eq!(db.list_show().unwrap().as_ref(), b"item");

    // New writes continue the same journal
    db.set("more", "1").unwrap();
    drop(db);
    drop(core);
    let core = StorageCore::open(&config_for(&dir)).unwrap();
    assert_eq!(core.default_database().unwrap().len(), 2);
}

#[test]
fn test_no_recover_on_startup_starts_empty() {
    let (_temp, dir) = setup_temp_storage();
    {
        let core = StorageCore::open(&config_for(&dir)).unwrap();
        core.default_database().unwrap().set("hello", "world").unwrap();
    }

    let config = Config::builder()
        .data_dir(&dir)
        .recover_on_startup(false)
        .build();
    let core = StorageCore::open(&config).unwrap();
    let db = core.default_database().unwrap();
    assert!(db.is_empty());

    core.recover(DEFAULT_DATABASE).unwrap();
    assert_eq!(db.get("hello").unwrap().data().as_ref(), b"world");
}

#[test]
fn test_journal_disabled_writes_no_file() {
    let (_temp, dir) = setup_temp_storage();
    let config = Config::builder()
        .data_dir(&dir)
        .journal_enabled(false)
        .build();

    let core = StorageCore::open(&config).unwrap();
    let db = core.default_database().unwrap();
    db.set("k", "v").unwrap();

    assert!(!db.is_journaled());
    assert!(!dir.join(Database::log_file_name(0)).exists());
}
