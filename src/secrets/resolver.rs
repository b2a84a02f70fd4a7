//! Typed resolution of the licence and encryption keys.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use zeroize::Zeroizing;

use super::store::SecretStore;
use crate::config::{ENCRYPTION_KEY_VAR, LICENSE_KEY_VAR};
use crate::telemetry::{self, log_security_event, SecurityEvent};

/// Placeholder key used when no encryption key is configured.
///
/// Known and public; it is not valid Fernet key material, so decrypting
/// with it always fails. Production deployments must set
/// `AVA_ENCRYPTION_KEY`.
pub const FALLBACK_ENCRYPTION_KEY: &[u8] = b"YOUR_STATIC_KEY";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("AVA_ENCRYPTION_KEY is not configured and strict mode forbids the placeholder key")]
    PlaceholderKeyRejected,
}

/// Where a resolved secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Environment,
    File,
    Placeholder,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Environment => write!(f, "environment"),
            KeySource::File => write!(f, "file"),
            KeySource::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// A configured secret value and its source.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    pub value: String,
    pub source: KeySource,
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// The secrets this application knows about, read from a `SecretStore`.
///
/// An empty licence key in the file is kept as configured; an empty
/// encryption key from either source counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretsConfig {
    pub license_key: Option<ResolvedSecret>,
    pub encryption_key: Option<ResolvedSecret>,
}

impl SecretsConfig {
    pub fn from_store(store: &SecretStore) -> Self {
        Self {
            license_key: lookup(store, LICENSE_KEY_VAR),
            encryption_key: lookup(store, ENCRYPTION_KEY_VAR).filter(|s| !s.value.is_empty()),
        }
    }
}

fn lookup(store: &SecretStore, key: &str) -> Option<ResolvedSecret> {
    if let Some(value) = store.env_value(key) {
        return Some(ResolvedSecret { value, source: KeySource::Environment });
    }
    store
        .file_value(key)
        .map(|value| ResolvedSecret { value, source: KeySource::File })
}

/// Raw encryption key material, zeroed on drop.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: Zeroizing<Vec<u8>>,
    source: KeySource,
}

impl EncryptionKey {
    pub fn new(bytes: impl Into<Vec<u8>>, source: KeySource) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
            source,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(FALLBACK_ENCRYPTION_KEY, KeySource::Placeholder)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == KeySource::Placeholder
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Resolves typed credentials from a shared `SecretStore`.
#[derive(Debug, Clone)]
pub struct KeyResolver {
    store: Arc<SecretStore>,
}

impl KeyResolver {
    pub fn new(store: Arc<SecretStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// Snapshot of both secrets with their sources.
    pub fn secrets(&self) -> SecretsConfig {
        SecretsConfig::from_store(&self.store)
    }

    /// Licence key, if configured. Not validated.
    pub fn resolve_license_key(&self) -> Option<String> {
        self.secrets().license_key.map(|secret| secret.value)
    }

    /// Encryption key as UTF-8 bytes, or the placeholder if unconfigured.
    pub fn resolve_encryption_key(&self) -> EncryptionKey {
        match self.secrets().encryption_key {
            Some(secret) => {
                tracing::debug!(source = %secret.source, "Resolved encryption key");
                EncryptionKey::new(secret.value.into_bytes(), secret.source)
            }
            None => {
                log_security_event(
                    SecurityEvent::PlaceholderKeyInUse,
                    "No encryption key configured, using insecure placeholder",
                    &[("variable", ENCRYPTION_KEY_VAR)],
                );
                telemetry::record_placeholder_key();
                EncryptionKey::placeholder()
            }
        }
    }

    /// Like `resolve_encryption_key`, but refuses the placeholder.
    pub fn require_encryption_key(&self) -> Result<EncryptionKey, CredentialError> {
        match self.secrets().encryption_key {
            Some(secret) => Ok(EncryptionKey::new(secret.value.into_bytes(), secret.source)),
            None => {
                log_security_event(
                    SecurityEvent::PlaceholderKeyRejected,
                    "No encryption key configured and strict mode is on",
                    &[("variable", ENCRYPTION_KEY_VAR)],
                );
                Err(CredentialError::PlaceholderKeyRejected)
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
