//! Model artifact decryption.
//!
//! A model file holds a single Fernet token. The whole file is read and
//! decrypted in memory; there is no streaming and no retry. Failures are
//! always returned to the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use super::fernet::{FernetError, FernetKey};
use crate::secrets::CredentialError;
use crate::telemetry::{self, log_security_event, SecurityEvent};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to access model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Model decryption failed: {0}")]
    Decryption(#[from] FernetError),
    #[error("Encryption key unavailable: {0}")]
    KeyUnavailable(#[from] CredentialError),
}

/// Decrypts model files with url-safe base64 Fernet key material.
#[derive(Debug, Clone, Default)]
pub struct ModelDecryptor {
    ttl: Option<Duration>,
}

impl ModelDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject tokens older than `ttl`.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Read `path` and decrypt its contents with `key`.
    pub fn decrypt(&self, path: &Path, key: &[u8]) -> Result<Vec<u8>, ModelError> {
        let token = read_file(path)?;
        let result = FernetKey::from_encoded(key).and_then(|k| k.decrypt_with_ttl(&token, self.ttl));
        telemetry::record_decryption(result.is_ok());

        match result {
            Ok(plaintext) => {
                tracing::debug!(
                    path = %path.display(),
                    bytes = plaintext.len(),
                    "Decrypted model file"
                );
                Ok(plaintext)
            }
            Err(e) => {
                let path = path.display().to_string();
                let reason = e.to_string();
                log_security_event(
                    SecurityEvent::DecryptionFailed,
                    "Model file rejected",
                    &[("path", &path), ("reason", &reason)],
                );
                Err(e.into())
            }
        }
    }
}

/// Decrypt the model file at `path` with `key`, with no age limit.
pub fn decrypt_model(path: impl AsRef<Path>, key: &[u8]) -> Result<Vec<u8>, ModelError> {
    ModelDecryptor::new().decrypt(path.as_ref(), key)
}

/// Encrypt `input` into a model token file at `output`.
pub fn encrypt_model(input: &Path, output: &Path, key: &[u8]) -> Result<(), ModelError> {
    let fernet = FernetKey::from_encoded(key)?;
    let plaintext = read_file(input)?;
    let token = fernet.encrypt(&plaintext)?;
    std::fs::write(output, &token).map_err(|source| ModelError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        bytes = plaintext.len(),
        "Encrypted model file"
    );
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, ModelError> {
    std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "model_decryptor_tests.rs"]
mod tests;
