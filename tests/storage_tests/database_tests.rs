//! Tests for Database
//!
//! These tests verify:
//! - Map and list operations with and without a journal
//! - Replay semantics (fresh state, order, skipped deletes)
//! - Recovery errors and torn-tail handling

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use lodekv::config::LogSyncStrategy;
use lodekv::error::LodeError;
use lodekv::journal::{Action, JournalWriter, MAX_RECORD_SIZE};
use lodekv::Database;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().to_path_buf();
    (temp_dir, path)
}

fn open_journaled(dir: &PathBuf) -> Database {
    Database::open(0, dir, true, LogSyncStrategy::EveryWrite).unwrap()
}

fn sorted_keys(db: &Database) -> Vec<String> {
    let mut keys = db.keys();
    keys.sort();
    keys
}

// =============================================================================
// Map Tests
// =============================================================================

#[test]
fn test_set_and_get() {
    let db = Database::new(0);
    db.set("hello", "world").unwrap();

    assert_eq!(db.get("hello").unwrap().data().as_ref(), b"world");
    assert!(db.contains_key("hello"));
    assert_eq!(db.len(), 1);
}

#[test]
fn test_set_overwrites() {
    let db = Database::new(0);
    db.set("k", "one").unwrap();
    db.set("k", "two").unwrap();

    assert_eq!(db.get("k").unwrap().into_bytes().as_ref(), b"two");
    assert_eq!(db.len(), 1);
}

#[test]
fn test_empty_value_is_retrievable() {
    let db = Database::new(0);
    db.set("k", "").unwrap();

    assert!(db.get("k").unwrap().data().is_empty());
}

#[test]
fn test_get_missing_key() {
    let db = Database::new(0);
    let err = db.get("missing").unwrap_err();

    assert!(matches!(err, LodeError::KeyNotFound(ref k) if k == "missing"));
    assert_eq!(err.to_string(), "there is no item with key of missing");
}

#[test]
fn test_del_then_get_fails() {
    let db = Database::new(0);
    db.set("k", "v").unwrap();
    db.del("k").unwrap();

    assert!(matches!(db.get("k"), Err(LodeError::KeyNotFound(_))));
    assert!(matches!(db.del("k"), Err(LodeError::KeyNotFound(_))));
    assert!(db.is_empty());
}

#[test]
fn test_keys_lists_every_live_key() {
    let db = Database::new(0);
    db.set("world", "1").unwrap();
    db.set("hello", "2").unwrap();
    db.set("gone", "3").unwrap();
    db.del("gone").unwrap();

    assert_eq!(sorted_keys(&db), vec!["hello", "world"]);
}

#[test]
fn test_journaled_set_rejects_non_utf8() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);

    let err = db.set("k", vec![0xFFu8, 0xFE]).unwrap_err();
    assert!(matches!(err, LodeError::Serialization(_)));
    assert!(!db.contains_key("k"));
}

#[test]
fn test_in_memory_set_accepts_raw_bytes() {
    let db = Database::new(0);
    db.set("k", vec![0xFFu8, 0x00]).unwrap();
    assert_eq!(db.get("k").unwrap().data().as_ref(), &[0xFF, 0x00]);
}

// =============================================================================
// List Tests
// =============================================================================

#[test]
fn test_list_operations() {
    let db = Database::new(0);
    assert!(matches!(db.list_show(), Err(LodeError::ListEmpty)));
    assert!(matches!(db.list_get(b"a"), Err(LodeError::ListEmpty)));
    assert!(matches!(db.list_delete(b"a"), Err(LodeError::ListEmpty)));

    db.list_insert("a").unwrap();
    db.list_insert("b").unwrap();
    db.list_insert("a").unwrap();

    assert_eq!(db.list_show().unwrap().as_ref(), b"a, b, a");
    assert_eq!(db.list_get(b"b").unwrap().as_ref(), b"b");
    assert!(matches!(db.list_get(b"z"), Err(LodeError::ListValueNotFound)));

    db.list_delete(b"a").unwrap();
    assert_eq!(db.list_show().unwrap().as_ref(), b"b, a");
    assert_eq!(db.list_len(), 2);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recover_in_memory_database_fails() {
    let db = Database::new(3);
    let err = db.recover().unwrap_err();

    assert!(matches!(err, LodeError::NoJournal(3)));
    assert_eq!(err.to_string(), "no journal for database 3");
}

#[test]
fn test_recover_without_log_file_fails() {
    let (_temp, dir) = setup_temp_dir();
    let db = Database::open(0, &dir, false, LogSyncStrategy::EveryWrite).unwrap();

    assert!(matches!(db.recover(), Err(LodeError::NoJournal(0))));
}

#[test]
fn test_recover_rebuilds_from_empty_state() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);

    db.set("a", "1").unwrap();
    db.set("b", "2").unwrap();
    db.list_insert("x").unwrap();

    // Replaying must not double-apply on top of live state
    let report = db.recover().unwrap();
    assert_eq!(report.entries_applied, 3);
    assert_eq!(report.entries_skipped, 0);
    assert_eq!(sorted_keys(&db), vec!["a", "b"]);
    assert_eq!(db.list_show().unwrap().as_ref(), b"x");

    db.recover().unwrap();
    assert_eq!(db.list_len(), 1);
}

#[test]
fn test_recover_discards_unjournaled_state() {
    let (_temp, dir) = setup_temp_dir();
    {
        let db = open_journaled(&dir);
        db.set("kept", "1").unwrap();
    }

    let db = Database::open(0, &dir, false, LogSyncStrategy::EveryWrite).unwrap();
    db.set("lost", "2").unwrap();
    db.recover().unwrap();

    assert_eq!(sorted_keys(&db), vec!["kept"]);
}

#[test]
fn test_replay_applies_in_order() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);

    db.set("a", "1").unwrap();
    db.set("a", "2").unwrap();
    db.del("a").unwrap();
    db.set("b", "3").unwrap();
    db.set("b", "4").unwrap();

    db.recover().unwrap();

    assert!(!db.contains_key("a"));
    assert_eq!(db.get("b").unwrap().data().as_ref(), b"4");
}

#[test]
fn test_replay_list_insert_uses_value() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);

    db.list_insert("first").unwrap();
    db.list_insert("second").unwrap();
    db.list_delete(b"first").unwrap();

    db.recover().unwrap();
    assert_eq!(db.list_show().unwrap().as_ref(), b"second");
}

#[test]
fn test_replay_skips_delete_of_missing_key() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join(Database::log_file_name(0));
    {
        let mut writer = JournalWriter::open(&path, LogSyncStrategy::EveryWrite).unwrap();
        writer.append(Action::Del, vec!["ghost".to_string()]).unwrap();
        writer
            .append(Action::Set, vec!["k".to_string(), "v".to_string()])
            .unwrap();
    }

    let db = open_journaled(&dir);
    let report = db.recover().unwrap();

    assert_eq!(report.entries_applied, 1);
    assert_eq!(report.entries_skipped, 1);
    assert_eq!(sorted_keys(&db), vec!["k"]);
}

#[test]
fn test_replay_rejects_wrong_arity_and_keeps_state() {
    let (_temp, dir) = setup_temp_dir();
    let path = dir.join(Database::log_file_name(0));
    {
        let mut writer = JournalWriter::open(&path, LogSyncStrategy::EveryWrite).unwrap();
        writer.append(Action::Set, vec!["only-key".to_string()]).unwrap();
    }

    let db = Database::open(0, &dir, false, LogSyncStrategy::EveryWrite).unwrap();
    db.set("live", "1").unwrap();

    assert!(matches!(db.recover(), Err(LodeError::LogCorruption(_))));
    assert_eq!(sorted_keys(&db), vec!["live"]);
}

#[test]
fn test_recover_after_torn_tail_keeps_appending() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);
    db.set("a", "1").unwrap();

    let path = db.log_path().unwrap().to_path_buf();
    let valid_len = fs::metadata(&path).unwrap().len();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[7, 7, 7]).unwrap();
    drop(file);

    let report = db.recover().unwrap();
    assert!(report.journal.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);

    db.set("b", "2").unwrap();
    db.recover().unwrap();
    assert_eq!(sorted_keys(&db), vec!["a", "b"]);
}

#[test]
fn test_failed_recover_keeps_journaling() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);
    db.set("a", "1").unwrap();

    // A directory where the log should be makes every read of it fail
    let path = db.log_path().unwrap().to_path_buf();
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    assert!(matches!(db.recover(), Err(LodeError::Io(_))));
    assert!(db.is_journaled());
    assert_eq!(db.get("a").unwrap().data().as_ref(), b"1");
    db.set("b", "2").unwrap();
}

#[test]
fn test_replayed_value_keeps_write_time() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);
    db.set("a", "1").unwrap();
    let written_at = db.get("a").unwrap().written_at();

    db.recover().unwrap();
    let replayed = db.get("a").unwrap().written_at();

    // Journal timestamps are taken at append time, just after the write
    assert!(replayed >= written_at);
}

// =============================================================================
// Rollback Tests
// =============================================================================

#[test]
fn test_failed_append_rolls_back_set() {
    let (_temp, dir) = setup_temp_dir();
    let db = open_journaled(&dir);
    db.set("k", "old").unwrap();

    // Too large to journal, so the append fails after the map was updated
    let huge = "a".repeat(MAX_RECORD_SIZE + 1);
    assert!(matches!(db.set("k", huge), Err(LodeError::LogWrite(_))));
    assert_eq!(db.get("k").unwrap().data().as_ref(), b"old");

    db.recover().unwrap();
    assert_eq!(db.get("k").unwrap().data().as_ref(), b"old");
}
