//! Application-facing credential facade.
//!
//! Owns the single `SecretStore` for the process and exposes licence,
//! key and model operations over it. Construct once at startup and share.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::CredentialConfig;
use crate::secrets::{CredentialError, EncryptionKey, KeyResolver, KeySource, SecretStore};
use crate::security::{self, ModelDecryptor, ModelError};

/// Credentials resolved from one store under one configuration.
#[derive(Debug, Clone)]
pub struct Credentials {
    config: CredentialConfig,
    resolver: KeyResolver,
    decryptor: ModelDecryptor,
}

/// Summary of the credential setup, safe to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub dotenv_path: String,
    pub license_source: Option<KeySource>,
    pub license_valid: bool,
    pub encryption_key_source: KeySource,
    pub strict_keys: bool,
    pub device_id: String,
}

impl Credentials {
    /// Credentials over the process environment and `config.dotenv_path`.
    pub fn new(config: CredentialConfig) -> Self {
        let store = Arc::new(SecretStore::new(config.dotenv_path.clone()));
        Self::with_store(config, store)
    }

    pub fn with_store(config: CredentialConfig, store: Arc<SecretStore>) -> Self {
        let decryptor = ModelDecryptor::with_ttl(config.token_ttl);
        Self {
            config,
            resolver: KeyResolver::new(store),
            decryptor,
        }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub fn license_key(&self) -> Option<String> {
        self.resolver.resolve_license_key()
    }

    /// Encryption key, falling back to the placeholder. Never fails.
    pub fn encryption_key(&self) -> EncryptionKey {
        self.resolver.resolve_encryption_key()
    }

    /// Encryption key, honouring `strict_keys`.
    pub fn checked_encryption_key(&self) -> Result<EncryptionKey, CredentialError> {
        if self.config.strict_keys {
            self.resolver.require_encryption_key()
        } else {
            Ok(self.resolver.resolve_encryption_key())
        }
    }

    /// Decrypt a model file with the resolved encryption key.
    pub fn decrypt_model(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, ModelError> {
        let key = self.checked_encryption_key()?;
        self.decryptor.decrypt(path.as_ref(), key.as_bytes())
    }

    /// True iff the configured licence key matches this device.
    pub fn license_is_valid(&self) -> bool {
        match self.license_key() {
            Some(key) => security::validate_license(&key),
            None => {
                tracing::debug!("No licence key configured");
                false
            }
        }
    }

    pub fn status(&self) -> CredentialStatus {
        let secrets = self.resolver.secrets();
        let license_valid = secrets
            .license_key
            .as_ref()
            .map(|secret| security::validate_license(&secret.value))
            .unwrap_or(false);
        CredentialStatus {
            dotenv_path: self.resolver.store().dotenv_path().display().to_string(),
            license_source: secrets.license_key.as_ref().map(|s| s.source),
            license_valid,
            encryption_key_source: secrets
                .encryption_key
                .as_ref()
                .map(|s| s.source)
                .unwrap_or(KeySource::Placeholder),
            strict_keys: self.config.strict_keys,
            device_id: security::device_id(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(CredentialConfig::default())
    }
}
