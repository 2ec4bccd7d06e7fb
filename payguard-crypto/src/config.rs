//! Key configuration for the field encryptor.
//!
//! The secret and salt are supplied at process start. Both default to
//! placeholders which [`KeyConfig::validate`] rejects unless
//! `allow_placeholder` is set.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, MIN_SALT_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLACEHOLDER_SECRET: &str = "change-me-pii-secret";
pub const PLACEHOLDER_SALT: &str = "change-me-pii-salt";

pub const ENV_SECRET: &str = "PAYGUARD_PII_SECRET";
pub const ENV_SALT: &str = "PAYGUARD_PII_SALT";
pub const ENV_MODE: &str = "PAYGUARD_CIPHER_MODE";
pub const ENV_ALLOW_PLACEHOLDER: &str = "PAYGUARD_ALLOW_PLACEHOLDER_KEYS";

/// Which cipher new values are written with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherMode {
    /// AES-128-ECB, no IV. Compatible with existing stored values.
    #[default]
    Deterministic,
    /// ChaCha20-Poly1305 with a random nonce and an Argon2id-derived key.
    Sealed,
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherMode::Deterministic => f.write_str("deterministic"),
            CipherMode::Sealed => f.write_str("sealed"),
        }
    }
}

impl FromStr for CipherMode {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(CipherMode::Deterministic),
            "sealed" => Ok(CipherMode::Sealed),
            other => Err(CryptoError::Config(format!("unknown cipher mode: {other}"))),
        }
    }
}

/// Configuration for [`FieldEncryptor`](crate::FieldEncryptor).
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    pub secret: String,

    /// Salt for the sealed-mode Argon2id derivation (at least 8 bytes).
    pub salt: String,

    #[serde(default)]
    pub mode: CipherMode,

    #[serde(default)]
    pub kdf: KdfParams,

    /// Accept placeholder secrets. Local development and tests only.
    #[serde(default)]
    pub allow_placeholder: bool,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            secret: PLACEHOLDER_SECRET.to_string(),
            salt: PLACEHOLDER_SALT.to_string(),
            mode: CipherMode::default(),
            kdf: KdfParams::default(),
            allow_placeholder: false,
        }
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("secret", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("mode", &self.mode)
            .field("kdf", &self.kdf)
            .field("allow_placeholder", &self.allow_placeholder)
            .finish()
    }
}

impl KeyConfig {
    /// Builds a config with the given secret and salt and default settings.
    pub fn new(secret: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            salt: salt.into(),
            ..Self::default()
        }
    }

    /// Loads overrides from the process environment on top of the defaults.
    pub fn from_env() -> CryptoResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads overrides through `lookup` (variable name to value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CryptoResult<Self> {
        let mut config = Self::default();
        if let Some(secret) = lookup(ENV_SECRET) {
            config.secret = secret;
        }
        if let Some(salt) = lookup(ENV_SALT) {
            config.salt = salt;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(flag) = lookup(ENV_ALLOW_PLACEHOLDER) {
            config.allow_placeholder = matches!(flag.trim(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// Rejects configurations that must never reach production.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.secret.is_empty() {
            return Err(CryptoError::InsecureConfig("secret is empty".to_string()));
        }
        if self.mode == CipherMode::Sealed && self.salt.len() < MIN_SALT_SIZE {
            return Err(CryptoError::Config(format!(
                "salt must be at least {MIN_SALT_SIZE} bytes in sealed mode"
            )));
        }
        if !self.allow_placeholder {
            if self.secret == PLACEHOLDER_SECRET {
                return Err(CryptoError::InsecureConfig(
                    "secret is the built-in placeholder".to_string(),
                ));
            }
            if self.salt == PLACEHOLDER_SALT {
                return Err(CryptoError::InsecureConfig(
                    "salt is the built-in placeholder".to_string(),
                ));
            }
        }
        Ok(())
    }
}
