//! Key material for field encryption.
//!
//! Two derivations exist side by side:
//!
//! - [`derive_key`]: the compatible derivation. The secret's UTF-8 bytes are
//!   truncated or zero-padded to 16 bytes. This is not a key-derivation
//!   function; it is kept only so existing deterministic ciphertext stays
//!   readable.
//! - [`derive_sealed_key`]: Argon2id over the secret and the configured salt,
//!   producing a 256-bit key for the sealed (authenticated) mode.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length of the deterministic block cipher (AES-128).
pub const FIELD_KEY_SIZE: usize = 16;

/// Key length of the sealed AEAD (ChaCha20-Poly1305).
pub const SEALED_KEY_SIZE: usize = 32;

/// Minimum salt length accepted by Argon2.
pub const MIN_SALT_SIZE: usize = 8;

/// 128-bit key for the deterministic field cipher.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct FieldKey([u8; FIELD_KEY_SIZE]);

impl FieldKey {
    pub fn from_bytes(bytes: [u8; FIELD_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldKey(<redacted>)")
    }
}

/// 256-bit key for the sealed field cipher.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; SEALED_KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; SEALED_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SEALED_KEY_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: SEALED_KEY_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; SEALED_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Derives the 128-bit deterministic-mode key from a secret.
///
/// Secrets longer than 16 bytes are truncated, shorter ones are padded with
/// zero bytes. The same secret always yields the same key.
pub fn derive_key(secret: &str) -> FieldKey {
    let mut bytes = [0u8; FIELD_KEY_SIZE];
    let src = secret.as_bytes();
    let n = src.len().min(FIELD_KEY_SIZE);
    bytes[..n].copy_from_slice(&src[..n]);
    FieldKey(bytes)
}

/// Derives the 256-bit sealed-mode key from a secret and salt with Argon2id.
pub fn derive_sealed_key(
    secret: &str,
    salt: &[u8],
    params: &KdfParams,
) -> CryptoResult<DerivedKey> {
    if salt.len() < MIN_SALT_SIZE {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be at least {MIN_SALT_SIZE} bytes, got {}",
            salt.len()
        )));
    }

    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(SEALED_KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2 parameters: {e}")))?;

    let mut out = [0u8; SEALED_KEY_SIZE];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params)
        .hash_password_into(secret.as_bytes(), salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = DerivedKey(out);
    out.zeroize();
    Ok(key)
}
