//! Tests for the secret store.

use super::*;
use std::sync::Arc;
use tempfile::TempDir;

fn write_dotenv(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join(".env");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_environment_wins_over_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "AVA_LICENSE_KEY=from-file\n");
    let store = SecretStore::with_environment(&path, MapEnv::new().with_var("AVA_LICENSE_KEY", "from-env"));
    assert_eq!(store.get("AVA_LICENSE_KEY").as_deref(), Some("from-env"));
}

#[test]
fn test_empty_environment_value_falls_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "AVA_LICENSE_KEY=from-file\n");
    let store = SecretStore::with_environment(&path, MapEnv::new().with_var("AVA_LICENSE_KEY", ""));
    assert_eq!(store.get("AVA_LICENSE_KEY").as_deref(), Some("from-file"));
}

#[test]
fn test_precedence_is_per_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "A=file-a\nB=file-b\n");
    let store = SecretStore::with_environment(&path, MapEnv::new().with_var("A", "env-a"));
    assert_eq!(store.get("A").as_deref(), Some("env-a"));
    assert_eq!(store.get("B").as_deref(), Some("file-b"));
    assert_eq!(store.get("C"), None);
}

#[test]
fn test_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = SecretStore::with_environment(dir.path().join(".env"), MapEnv::new());
    assert_eq!(store.get("AVA_LICENSE_KEY"), None);
    assert!(store.file_values().is_empty());
}

#[test]
fn test_unreadable_file_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    // A directory at the secrets path cannot be read as a file.
    let store = SecretStore::with_environment(dir.path(), MapEnv::new().with_var("X", "env"));
    assert!(store.file_values().is_empty());
    assert_eq!(store.get("X").as_deref(), Some("env"));
}

#[test]
fn test_loads_lazily_and_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "FOO=first\n");
    let store = SecretStore::with_environment(&path, MapEnv::new());
    assert!(!store.is_loaded());

    assert_eq!(store.get("FOO").as_deref(), Some("first"));
    assert!(store.is_loaded());

    std::fs::write(&path, "FOO=second\nBAR=new\n").unwrap();
    assert_eq!(store.get("FOO").as_deref(), Some("first"));
    assert_eq!(store.get("BAR"), None);
}

#[test]
fn test_file_value_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "EMPTY=\n");
    let store = SecretStore::with_environment(&path, MapEnv::new());
    assert_eq!(store.get("EMPTY").as_deref(), Some(""));
}

#[test]
fn test_concurrent_first_access_sees_full_map() {
    let dir = tempfile::tempdir().unwrap();
    let contents: String = (0..200).map(|i| format!("KEY_{i}=value_{i}\n")).collect();
    let path = write_dotenv(&dir, &contents);
    let store = Arc::new(SecretStore::with_environment(&path, MapEnv::new()));

    std::thread::scope(|s| {
        for _ in 0..8 {
            let store = Arc::clone(&store);
            s.spawn(move || {
                assert_eq!(store.file_values().len(), 200);
                assert_eq!(store.get("KEY_199").as_deref(), Some("value_199"));
            });
        }
    });
}

#[test]
fn test_debug_does_not_leak_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dotenv(&dir, "AVA_ENCRYPTION_KEY=super-secret\n");
    let store = SecretStore::with_environment(&path, MapEnv::new());
    let _ = store.get("AVA_ENCRYPTION_KEY");
    let rendered = format!("{:?}", store);
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("loaded_keys"));
}

#[test]
fn test_process_env_reads_real_environment() {
    // PATH is set in every test runner environment.
    assert!(ProcessEnv.var("PATH").is_some());
    assert!(ProcessEnv.var("AVA_TEST_SURELY_UNSET_7F3A").is_none());
}
