use std::path::PathBuf;

use super::*;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("teamboard-storage-test-{}", uuid::Uuid::new_v4()))
}

fn ann() -> User {
    User { id: "u-1".to_owned(), username: "ann".to_owned() }
}

#[test]
fn missing_keys_read_as_none() {
    let storage = SessionStorage::new(temp_dir());
    assert!(storage.user().is_none());
    assert!(storage.token().is_none());
}

#[test]
fn token_round_trips() {
    let storage = SessionStorage::new(temp_dir());
    storage.set_token("t-123");
    assert_eq!(storage.token().as_deref(), Some("t-123"));
}

#[test]
fn user_round_trips() {
    let storage = SessionStorage::new(temp_dir());
    storage.set_user(&ann());
    assert_eq!(storage.user(), Some(ann()));
}

#[test]
fn clear_removes_both_keys() {
    let storage = SessionStorage::new(temp_dir());
    storage.set_user(&ann());
    storage.set_token("t-123");

    storage.clear();

    assert!(storage.user().is_none());
    assert!(storage.token().is_none());
}

#[test]
fn fresh_instance_reads_persisted_session() {
    let dir = temp_dir();
    let storage = SessionStorage::new(dir.clone());
    storage.set_user(&ann());
    storage.set_token("t-123");

    // Simulated process restart: a brand-new instance over the same dir.
    let restarted = SessionStorage::new(dir);
    assert_eq!(restarted.user(), Some(ann()));
    assert_eq!(restarted.token().as_deref(), Some("t-123"));
}

#[test]
fn writes_replace_the_previous_value_whole() {
    let storage = SessionStorage::new(temp_dir());
    storage.set_token("first");
    storage.set_token("second");
    assert_eq!(storage.token().as_deref(), Some("second"));
}
