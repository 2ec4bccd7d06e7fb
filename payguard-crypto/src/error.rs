//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur protecting or recovering field values.
///
/// `Encryption` and `Decryption` are never retried: a value that cannot be
/// protected or recovered must fail the surrounding write or read.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("insecure key configuration: {0}")]
    InsecureConfig(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
