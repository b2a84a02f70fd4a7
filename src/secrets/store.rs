//! Secret store over the process environment and a cached `.env` file.
//!
//! The file is read at most once per store. Environment lookups are made
//! fresh on every call, so a non-empty environment variable always wins
//! over the file value for that key.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::dotenv::load_dotenv;
use crate::telemetry::{log_security_event, SecurityEvent};

/// Source of environment variables.
pub trait Environment: Send + Sync {
    /// Value of `key`, or `None` if unset or not valid Unicode.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed in-memory environment, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Key/value secrets with environment precedence over a lazily loaded file.
pub struct SecretStore {
    env: Box<dyn Environment>,
    dotenv_path: PathBuf,
    cache: OnceLock<HashMap<String, String>>,
}

impl SecretStore {
    /// Store backed by the process environment.
    pub fn new(dotenv_path: impl Into<PathBuf>) -> Self {
        Self::with_environment(dotenv_path, ProcessEnv)
    }

    pub fn with_environment(dotenv_path: impl Into<PathBuf>, env: impl Environment + 'static) -> Self {
        Self {
            env: Box::new(env),
            dotenv_path: dotenv_path.into(),
            cache: OnceLock::new(),
        }
    }

    /// Look up `key`: non-empty environment value first, then the file.
    pub fn get(&self, key: &str) -> Option<String> {
        self.env_value(key).or_else(|| self.file_value(key))
    }

    /// Environment value for `key`, treating an empty value as unset.
    pub fn env_value(&self, key: &str) -> Option<String> {
        self.env.var(key).filter(|v| !v.is_empty())
    }

    /// File value for `key`, verbatim (may be empty).
    pub fn file_value(&self, key: &str) -> Option<String> {
        self.file_values().get(key).cloned()
    }

    /// The parsed `.env` mapping, loading it on first use.
    ///
    /// Concurrent first callers block until the single load finishes.
    pub fn file_values(&self) -> &HashMap<String, String> {
        self.cache.get_or_init(|| self.load())
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    pub fn dotenv_path(&self) -> &Path {
        &self.dotenv_path
    }

    fn load(&self) -> HashMap<String, String> {
        match load_dotenv(&self.dotenv_path) {
            Ok(values) => {
                tracing::debug!(
                    path = %self.dotenv_path.display(),
                    keys = values.len(),
                    "Loaded secrets file"
                );
                values
            }
            Err(e) => {
                let path = self.dotenv_path.display().to_string();
                let error = e.to_string();
                log_security_event(
                    SecurityEvent::ConfigUnreadable,
                    "Secrets file unreadable, continuing without file secrets",
                    &[("path", &path), ("error", &error)],
                );
                HashMap::new()
            }
        }
    }
}

impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("dotenv_path", &self.dotenv_path)
            .field("loaded_keys", &self.cache.get().map(HashMap::len))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
