//! Field-level PII encryption for PayGuard.
//!
//! Protects individual sensitive values (email, phone, national ids, card
//! numbers, …) before they are stored, and recovers them on read.
//!
//! # Modes
//!
//! 1. **Deterministic** (default): AES-128-ECB with PKCS#7 padding, base64
//!    text. The key is the secret's bytes truncated or zero-padded to 16
//!    bytes. Same plaintext, same ciphertext: stored values can be matched
//!    by equality, and block patterns leak.
//!
//! 2. **Sealed**: ChaCha20-Poly1305 with a fresh nonce per value and an
//!    Argon2id-derived key, text prefixed with `s1:`. Ciphertext is
//!    randomized and tamper-evident.
//!
//! A [`FieldEncryptor`] writes with its configured mode and reads both
//! formats, so a store can move from deterministic to sealed values
//! incrementally.
//!
//! Empty and absent values are never obfuscated.

pub mod cipher;
pub mod config;
mod encryptor;
mod error;
mod key;
pub mod sealed;

pub use config::{CipherMode, KeyConfig};
pub use encryptor::{FieldCipher, FieldEncryptor, PiiCategory};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    derive_key, derive_sealed_key, DerivedKey, FieldKey, KdfParams, FIELD_KEY_SIZE,
    MIN_SALT_SIZE, SEALED_KEY_SIZE,
};
