//! Fernet authenticated symmetric encryption.
//!
//! Token layout before url-safe base64 encoding:
//!
//! ```text
//! 0x80 | timestamp (u64 BE) | IV (16) | AES-128-CBC ciphertext (PKCS7) | HMAC-SHA256 (32)
//! ```
//!
//! The 32-byte key splits into a 16-byte HMAC signing key followed by a
//! 16-byte AES key. The HMAC covers everything before it and is checked in
//! constant time before any decryption happens.

use std::fmt;
use std::time::Duration;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// Decoded key size (signing half + encryption half)
pub const KEY_SIZE: usize = 32;
const HALF_KEY_SIZE: usize = KEY_SIZE / 2;
/// Token format version byte
pub const VERSION: u8 = 0x80;
/// IV size (one AES block)
pub const IV_SIZE: usize = 16;
/// HMAC-SHA256 tag size
pub const HMAC_SIZE: usize = 32;
const BLOCK_SIZE: usize = 16;
const TIMESTAMP_SIZE: usize = 8;
const HEADER_SIZE: usize = 1 + TIMESTAMP_SIZE + IV_SIZE;
const MIN_TOKEN_SIZE: usize = HEADER_SIZE + BLOCK_SIZE + HMAC_SIZE;
/// Tolerated clock skew for tokens stamped in the future (seconds)
pub const MAX_CLOCK_SKEW: u64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FernetError {
    #[error("Fernet key must be 32 url-safe base64-encoded bytes")]
    InvalidKey,
    #[error("Malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("Token signature verification failed")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Token timestamp is too far in the future")]
    FromFuture,
    #[error("Ciphertext decryption failed")]
    Decryption,
}

/// Fernet key material, zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FernetKey {
    signing_key: [u8; HALF_KEY_SIZE],
    encryption_key: [u8; HALF_KEY_SIZE],
}

impl FernetKey {
    /// Parse url-safe base64 key material (44 characters, padded).
    ///
    /// Surrounding ASCII whitespace is ignored.
    pub fn from_encoded(key: &[u8]) -> Result<Self, FernetError> {
        let decoded = Zeroizing::new(
            URL_SAFE
                .decode(key.trim_ascii())
                .map_err(|_| FernetError::InvalidKey)?,
        );
        if decoded.len() != KEY_SIZE {
            return Err(FernetError::InvalidKey);
        }
        let mut raw = Zeroizing::new([0u8; KEY_SIZE]);
        raw.copy_from_slice(&decoded);
        Ok(Self::from_raw(&raw))
    }

    pub fn from_raw(raw: &[u8; KEY_SIZE]) -> Self {
        let mut signing_key = [0u8; HALF_KEY_SIZE];
        let mut encryption_key = [0u8; HALF_KEY_SIZE];
        signing_key.copy_from_slice(&raw[..HALF_KEY_SIZE]);
        encryption_key.copy_from_slice(&raw[HALF_KEY_SIZE..]);
        Self {
            signing_key,
            encryption_key,
        }
    }

    /// Fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut raw = Zeroizing::new([0u8; KEY_SIZE]);
        rand::rngs::OsRng.fill_bytes(&mut raw[..]);
        Self::from_raw(&raw)
    }

    /// Url-safe base64 form, as accepted by `from_encoded`.
    pub fn to_encoded(&self) -> Zeroizing<String> {
        let mut raw = Zeroizing::new([0u8; KEY_SIZE]);
        raw[..HALF_KEY_SIZE].copy_from_slice(&self.signing_key);
        raw[HALF_KEY_SIZE..].copy_from_slice(&self.encryption_key);
        Zeroizing::new(URL_SAFE.encode(&raw[..]))
    }

    /// Encrypt `plaintext` into a token stamped with the current time.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, FernetError> {
        self.encrypt_at_time(plaintext, current_time())
    }

    pub fn encrypt_at_time(&self, plaintext: &[u8], timestamp: u64) -> Result<Vec<u8>, FernetError> {
        use rand::RngCore;
        let mut iv = [0u8; IV_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        self.encrypt_from_parts(plaintext, timestamp, &iv)
    }

    pub(crate) fn encrypt_from_parts(
        &self,
        plaintext: &[u8],
        timestamp: u64,
        iv: &[u8; IV_SIZE],
    ) -> Result<Vec<u8>, FernetError> {
        let ciphertext = Aes128CbcEnc::new_from_slices(&self.encryption_key, iv)
            .map_err(|_| FernetError::InvalidKey)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut data = Vec::with_capacity(HEADER_SIZE + ciphertext.len() + HMAC_SIZE);
        data.push(VERSION);
        data.extend_from_slice(&timestamp.to_be_bytes());
        data.extend_from_slice(iv);
        data.extend_from_slice(&ciphertext);

        let tag = self.mac()?.chain_update(&data).finalize().into_bytes();
        data.extend_from_slice(&tag);
        Ok(URL_SAFE.encode(data).into_bytes())
    }

    /// Decrypt a token without any age limit.
    pub fn decrypt(&self, token: &[u8]) -> Result<Vec<u8>, FernetError> {
        self.decrypt_with_ttl(token, None)
    }

    /// Decrypt a token, rejecting it if older than `ttl`.
    pub fn decrypt_with_ttl(&self, token: &[u8], ttl: Option<Duration>) -> Result<Vec<u8>, FernetError> {
        self.decrypt_at_time(token, ttl, current_time())
    }

    pub fn decrypt_at_time(
        &self,
        token: &[u8],
        ttl: Option<Duration>,
        now: u64,
    ) -> Result<Vec<u8>, FernetError> {
        let data = self.verified_token(token)?;
        if let Some(ttl) = ttl {
            let timestamp = read_timestamp(&data);
            if timestamp.saturating_add(ttl.as_secs()) < now {
                return Err(FernetError::Expired);
            }
            if now.saturating_add(MAX_CLOCK_SKEW) < timestamp {
                return Err(FernetError::FromFuture);
            }
        }

        let iv = &data[1 + TIMESTAMP_SIZE..HEADER_SIZE];
        let ciphertext = &data[HEADER_SIZE..data.len() - HMAC_SIZE];
        Aes128CbcDec::new_from_slices(&self.encryption_key, iv)
            .map_err(|_| FernetError::InvalidKey)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| FernetError::Decryption)
    }

    /// Creation time of an authentic token, without decrypting it.
    pub fn extract_timestamp(&self, token: &[u8]) -> Result<u64, FernetError> {
        let data = self.verified_token(token)?;
        Ok(read_timestamp(&data))
    }

    /// Decode `token`, check its shape and verify its HMAC.
    fn verified_token(&self, token: &[u8]) -> Result<Vec<u8>, FernetError> {
        let data = URL_SAFE
            .decode(token.trim_ascii())
            .map_err(|_| FernetError::MalformedToken("invalid base64"))?;
        if data.first() != Some(&VERSION) {
            return Err(FernetError::MalformedToken("unsupported version"));
        }
        if data.len() < MIN_TOKEN_SIZE {
            return Err(FernetError::MalformedToken("token too short"));
        }

        let (signed, tag) = data.split_at(data.len() - HMAC_SIZE);
        self.mac()?
            .chain_update(signed)
            .verify_slice(tag)
            .map_err(|_| FernetError::InvalidSignature)?;

        if (signed.len() - HEADER_SIZE) % BLOCK_SIZE != 0 {
            return Err(FernetError::MalformedToken("ciphertext not block aligned"));
        }
        Ok(data)
    }

    fn mac(&self) -> Result<HmacSha256, FernetError> {
        HmacSha256::new_from_slice(&self.signing_key).map_err(|_| FernetError::InvalidKey)
    }
}

impl fmt::Debug for FernetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FernetKey(<redacted>)")
    }
}

fn read_timestamp(data: &[u8]) -> u64 {
    let mut bytes = [0u8; TIMESTAMP_SIZE];
    bytes.copy_from_slice(&data[1..1 + TIMESTAMP_SIZE]);
    u64::from_be_bytes(bytes)
}

/// Seconds since the Unix epoch; zero if the clock is before 1970.
pub fn current_time() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Token timestamp as a UTC date, if representable.
pub fn issued_at(timestamp: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(timestamp).ok()?, 0)
}

#[cfg(test)]
#[path = "fernet_tests.rs"]
mod tests;
