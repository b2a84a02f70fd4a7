//! Model encryption and device licensing.
//!
//! - `fernet`: the authenticated token scheme model files are stored in
//! - `model_decryptor`: whole-file model decryption (and the paired encryption)
//! - `license`: device fingerprint and licence validation

pub mod fernet;
pub mod license;
pub mod model_decryptor;

pub use fernet::{FernetError, FernetKey};
pub use license::{device_id, fingerprint, node_id, validate_license};
pub use model_decryptor::{decrypt_model, encrypt_model, ModelDecryptor, ModelError};
