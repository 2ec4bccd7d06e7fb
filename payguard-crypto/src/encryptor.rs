//! Field encryptor: the in-process call surface used by the storage layer.

use crate::cipher;
use crate::config::{CipherMode, KeyConfig};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, FieldKey, KdfParams, derive_key, derive_sealed_key};
use crate::sealed;
use payguard_types::{Record, RecordValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// PII categories. The category names intent at call sites and in logs; it
/// does not change how a value is encrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Email,
    Phone,
    Address,
    Name,
    /// Bank Verification Number.
    Bvn,
    /// National Identification Number.
    Nin,
    Ssn,
    CardNumber,
}

impl PiiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
            PiiCategory::Address => "address",
            PiiCategory::Name => "name",
            PiiCategory::Bvn => "bvn",
            PiiCategory::Nin => "nin",
            PiiCategory::Ssn => "ssn",
            PiiCategory::CardNumber => "card_number",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reversible field protection, as seen by the storage collaborator.
pub trait FieldCipher: Send + Sync {
    /// Protects a value before it is written.
    fn encrypt_value(&self, category: PiiCategory, plaintext: &str) -> CryptoResult<String>;

    /// Recovers a value after it is read.
    fn decrypt_value(&self, category: PiiCategory, ciphertext: &str) -> CryptoResult<String>;

    /// The mode new values are written with.
    fn mode(&self) -> CipherMode;
}

/// Holds the process-wide key material, read-only after construction.
///
/// Build it once at startup and share it (`Arc<FieldEncryptor>`); every
/// operation is a pure function of its input and the keys.
#[derive(Clone)]
pub struct FieldEncryptor {
    mode: CipherMode,
    field_key: FieldKey,
    sealed_key: Option<DerivedKey>,
}

impl fmt::Debug for FieldEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEncryptor")
            .field("mode", &self.mode)
            .field("sealed_key", &self.sealed_key.is_some())
            .finish_non_exhaustive()
    }
}

impl FieldEncryptor {
    /// Validates the config and derives the key material it calls for.
    ///
    /// The Argon2id derivation only runs in sealed mode.
    pub fn from_config(config: &KeyConfig) -> CryptoResult<Self> {
        config.validate()?;

        let field_key = derive_key(&config.secret);
        let sealed_key = match config.mode {
            CipherMode::Deterministic => None,
            CipherMode::Sealed => Some(derive_sealed_key(
                &config.secret,
                config.salt.as_bytes(),
                &config.kdf,
            )?),
        };

        info!("field encryptor ready (mode = {})", config.mode);
        Ok(Self {
            mode: config.mode,
            field_key,
            sealed_key,
        })
    }

    /// Deterministic-mode encryptor from a raw secret, without validation.
    pub fn deterministic(secret: &str) -> Self {
        Self {
            mode: CipherMode::Deterministic,
            field_key: derive_key(secret),
            sealed_key: None,
        }
    }

    /// Sealed-mode encryptor from a raw secret and salt, without validation.
    pub fn sealed(secret: &str, salt: &str, kdf: &KdfParams) -> CryptoResult<Self> {
        Ok(Self {
            mode: CipherMode::Sealed,
            field_key: derive_key(secret),
            sealed_key: Some(derive_sealed_key(secret, salt.as_bytes(), kdf)?),
        })
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    /// Encrypts with the configured mode. Empty input is returned unchanged.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        match (self.mode, &self.sealed_key) {
            (CipherMode::Sealed, Some(key)) => sealed::seal(plaintext, key),
            (CipherMode::Sealed, None) => Err(CryptoError::Encryption(
                "sealed mode without a sealed key".to_string(),
            )),
            (CipherMode::Deterministic, _) => cipher::encrypt(plaintext, &self.field_key),
        }
    }

    /// Decrypts either format. Empty input is returned unchanged.
    pub fn decrypt(&self, ciphertext: &str) -> CryptoResult<String> {
        if !sealed::is_sealed(ciphertext) {
            return cipher::decrypt(ciphertext, &self.field_key);
        }
        match &self.sealed_key {
            Some(key) => sealed::open(ciphertext, key),
            None => Err(CryptoError::Decryption(
                "sealed value but no sealed key configured".to_string(),
            )),
        }
    }

    /// [`encrypt`](Self::encrypt) for optional values; `None` passes through.
    pub fn encrypt_opt(&self, plaintext: Option<&str>) -> CryptoResult<Option<String>> {
        plaintext.map(|p| self.encrypt(p)).transpose()
    }

    /// [`decrypt`](Self::decrypt) for optional values; `None` passes through.
    pub fn decrypt_opt(&self, ciphertext: Option<&str>) -> CryptoResult<Option<String>> {
        ciphertext.map(|c| self.decrypt(c)).transpose()
    }

    pub fn encrypt_field(&self, category: PiiCategory, plaintext: &str) -> CryptoResult<String> {
        debug!(%category, "encrypting field");
        self.encrypt(plaintext)
    }

    pub fn decrypt_field(&self, category: PiiCategory, ciphertext: &str) -> CryptoResult<String> {
        debug!(%category, "decrypting field");
        self.decrypt(ciphertext)
    }

    /// Encrypts the named string fields of a record in place.
    ///
    /// Missing, null and non-string fields are skipped. Returns the number of
    /// fields transformed. On error the record may be partially transformed
    /// and must not be written.
    pub fn encrypt_record(&self, record: &mut Record, fields: &[&str]) -> CryptoResult<usize> {
        self.transform_record(record, fields, |value| self.encrypt(value))
    }

    /// Decrypts the named string fields of a record in place.
    pub fn decrypt_record(&self, record: &mut Record, fields: &[&str]) -> CryptoResult<usize> {
        self.transform_record(record, fields, |value| self.decrypt(value))
    }

    fn transform_record(
        &self,
        record: &mut Record,
        fields: &[&str],
        op: impl Fn(&str) -> CryptoResult<String>,
    ) -> CryptoResult<usize> {
        let mut transformed = 0;
        for &name in fields {
            if let Some(RecordValue::String(value)) = record.get_mut(name) {
                *value = op(value)?;
                transformed += 1;
            }
        }
        debug!("transformed {transformed} of {} requested fields", fields.len());
        Ok(transformed)
    }
}

impl FieldCipher for FieldEncryptor {
    fn encrypt_value(&self, category: PiiCategory, plaintext: &str) -> CryptoResult<String> {
        self.encrypt_field(category, plaintext)
    }

    fn decrypt_value(&self, category: PiiCategory, ciphertext: &str) -> CryptoResult<String> {
        self.decrypt_field(category, ciphertext)
    }

    fn mode(&self) -> CipherMode {
        self.mode
    }
}
