//! Tests for model file decryption.

use super::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn encrypted_model(key: &FernetKey, plaintext: &[u8]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let token = key.encrypt(plaintext).unwrap();
    file.as_file().write_all(&token).unwrap();
    file
}

#[test]
fn test_round_trip() {
    let key = FernetKey::generate();
    let plaintext: Vec<u8> = (0..4096).map(|i| (i * 7 % 256) as u8).collect();
    let file = encrypted_model(&key, &plaintext);
    let decrypted = decrypt_model(file.path(), key.to_encoded().as_bytes()).unwrap();
    assert_eq!(decrypted, plaintext);
}

#[test]
fn test_encrypt_model_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("weights.bin");
    let output = dir.path().join("weights.bin.enc");
    std::fs::write(&input, b"layer0:0.125,0.5").unwrap();

    let key = FernetKey::generate().to_encoded();
    encrypt_model(&input, &output, key.as_bytes()).unwrap();

    let on_disk = std::fs::read(&output).unwrap();
    assert!(on_disk.starts_with(b"gAAAAA"));
    assert_eq!(decrypt_model(&output, key.as_bytes()).unwrap(), b"layer0:0.125,0.5");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let key = FernetKey::generate().to_encoded();
    let result = decrypt_model(dir.path().join("absent.enc"), key.as_bytes());
    match result {
        Err(ModelError::Io { path, source }) => {
            assert!(path.ends_with("absent.enc"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_reported_before_bad_key() {
    let dir = TempDir::new().unwrap();
    let result = decrypt_model(dir.path().join("absent.enc"), b"YOUR_STATIC_KEY");
    assert!(matches!(result, Err(ModelError::Io { .. })));
}

#[test]
fn test_placeholder_key_fails_loudly() {
    let key = FernetKey::generate();
    let file = encrypted_model(&key, b"weights");
    let result = decrypt_model(file.path(), crate::secrets::FALLBACK_ENCRYPTION_KEY);
    assert!(matches!(result, Err(ModelError::Decryption(FernetError::InvalidKey))));
}

#[test]
fn test_wrong_key_is_decryption_error() {
    let right = FernetKey::generate();
    let file = encrypted_model(&right, b"weights");
    for _ in 0..8 {
        let wrong = FernetKey::generate();
        let result = decrypt_model(file.path(), wrong.to_encoded().as_bytes());
        assert!(matches!(result, Err(ModelError::Decryption(_))));
    }
}

#[test]
fn test_tampered_file_is_decryption_error() {
    let key = FernetKey::generate();
    let encoded = key.to_encoded();
    let file = encrypted_model(&key, b"model weights that must not change");
    let original = std::fs::read(file.path()).unwrap();

    for i in (0..original.len()).step_by(5) {
        let mut tampered = original.clone();
        tampered[i] ^= 0x01;
        std::fs::write(file.path(), &tampered).unwrap();
        let result = decrypt_model(file.path(), encoded.as_bytes());
        assert!(
            matches!(result, Err(ModelError::Decryption(_))),
            "flip at {} not rejected",
            i
        );
    }
}

#[test]
fn test_plaintext_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"\x00\x01GGUF raw model bytes").unwrap();
    let key = FernetKey::generate().to_encoded();
    let result = decrypt_model(file.path(), key.as_bytes());
    assert!(matches!(result, Err(ModelError::Decryption(FernetError::MalformedToken(_)))));
}

#[test]
fn test_ttl_rejects_old_token() {
    let key = FernetKey::generate();
    let file = NamedTempFile::new().unwrap();
    let token = key.encrypt_at_time(b"old weights", 1_000).unwrap();
    file.as_file().write_all(&token).unwrap();

    let encoded = key.to_encoded();
    let strict = ModelDecryptor::with_ttl(Some(Duration::from_secs(3600)));
    assert_eq!(strict.ttl(), Some(Duration::from_secs(3600)));
    assert_eq!(ModelDecryptor::new().ttl(), None);
    assert!(matches!(
        strict.decrypt(file.path(), encoded.as_bytes()),
        Err(ModelError::Decryption(FernetError::Expired))
    ));
    assert_eq!(ModelDecryptor::new().decrypt(file.path(), encoded.as_bytes()).unwrap(), b"old weights");
}

#[test]
fn test_error_messages() {
    let err = ModelError::from(FernetError::InvalidSignature);
    assert_eq!(err.to_string(), "Model decryption failed: Token signature verification failed");
}
