//! Secret resolution.
//!
//! - `dotenv`: `.env` parsing
//! - `store`: environment-over-file lookups with a load-once cache
//! - `resolver`: typed licence and encryption keys

pub mod dotenv;
pub mod resolver;
pub mod store;

pub use dotenv::{load_dotenv, parse_dotenv, DotenvError};
pub use resolver::{
    CredentialError, EncryptionKey, KeyResolver, KeySource, ResolvedSecret, SecretsConfig,
    FALLBACK_ENCRYPTION_KEY,
};
pub use store::{Environment, MapEnv, ProcessEnv, SecretStore};
