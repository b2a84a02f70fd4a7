//! AVA credential runtime.
//!
//! Resolves the licence key and model encryption key from the process
//! environment and a local `.env` file, and decrypts at-rest model
//! artifacts with the resolved key.
//!
//! - `secrets`: cached `.env` store and typed key resolution
//! - `security`: Fernet token scheme, model decryption, device licensing
//! - `credentials`: the facade handed to the rest of the application

pub mod config;
pub mod credentials;
pub mod secrets;
pub mod security;
pub mod telemetry;

pub use config::CredentialConfig;
pub use credentials::{CredentialStatus, Credentials};
pub use secrets::{
    CredentialError, EncryptionKey, KeyResolver, KeySource, SecretStore, SecretsConfig,
    FALLBACK_ENCRYPTION_KEY,
};
pub use security::{
    decrypt_model, device_id, encrypt_model, validate_license, FernetError, FernetKey, ModelDecryptor,
    ModelError,
};
