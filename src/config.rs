//! Credential configuration and well-known names.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the local secrets file.
pub const DOTENV_FILE_NAME: &str = ".env";
/// Licence key variable, looked up in the environment and the `.env` file.
pub const LICENSE_KEY_VAR: &str = "AVA_LICENSE_KEY";
/// Encryption key variable, looked up in the environment and the `.env` file.
pub const ENCRYPTION_KEY_VAR: &str = "AVA_ENCRYPTION_KEY";

/// Configuration for credential resolution and model decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    /// Location of the `.env` file. A missing file means "no file secrets".
    pub dotenv_path: PathBuf,
    /// Refuse to hand out the placeholder encryption key.
    pub strict_keys: bool,
    /// Maximum accepted age of a model token. `None` disables time checks.
    pub token_ttl: Option<Duration>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            dotenv_path: default_dotenv_path(),
            strict_keys: false,
            token_ttl: None,
        }
    }
}

impl CredentialConfig {
    pub fn with_dotenv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv_path = path.into();
        self
    }

    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.token_ttl = ttl;
        self
    }
}

/// Default `.env` location: next to the running executable.
///
/// Falls back to `./.env` when the executable path cannot be resolved
/// (some sandboxes hide `/proc/self/exe`).
pub fn default_dotenv_path() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => dotenv_path_for(&exe),
        Err(e) => {
            tracing::debug!(error = %e, "Executable path unavailable, using working directory");
            PathBuf::from(DOTENV_FILE_NAME)
        }
    }
}

/// `.env` path for an installed binary or module file.
pub fn dotenv_path_for(installed: &Path) -> PathBuf {
    let resolved = installed.canonicalize().unwrap_or_else(|_| installed.to_path_buf());
    match resolved.parent() {
        Some(dir) => dir.join(DOTENV_FILE_NAME),
        None => PathBuf::from(DOTENV_FILE_NAME),
    }
}
