//! Sealed field cipher: ChaCha20-Poly1305 with a random nonce per value.
//!
//! Text form is `s1:` followed by base64 of `nonce || ciphertext || tag`.
//! The prefix never appears in deterministic ciphertext (base64 has no `:`),
//! so both formats can coexist in one column.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

/// Format marker for sealed values.
pub const SEALED_PREFIX: &str = "s1:";

/// Nonce size for ChaCha20-Poly1305 (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag size.
pub const TAG_SIZE: usize = 16;

/// Returns true if the text carries the sealed format marker.
pub fn is_sealed(text: &str) -> bool {
    text.starts_with(SEALED_PREFIX)
}

/// Seals a field value. Empty input is returned unchanged.
pub fn seal(plaintext: &str, key: &DerivedKey) -> CryptoResult<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("cipher rejected key: {e}")))?;
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(format!("seal failed: {e}")))?;

    let mut raw = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ciphertext);
    Ok(format!("{SEALED_PREFIX}{}", STANDARD.encode(raw)))
}

/// Opens a sealed field value. Empty input is returned unchanged.
pub fn open(sealed: &str, key: &DerivedKey) -> CryptoResult<String> {
    if sealed.is_empty() {
        return Ok(String::new());
    }

    let body = sealed.strip_prefix(SEALED_PREFIX).ok_or_else(|| {
        CryptoError::Decryption("value is not in sealed format".to_string())
    })?;
    let raw = STANDARD
        .decode(body)
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
    if raw.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::Decryption(format!(
            "sealed value too short: {} bytes",
            raw.len()
        )));
    }

    let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::Decryption(format!("cipher rejected key: {e}")))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CryptoError::Decryption(
                "authentication failed (wrong key or tampered data)".to_string(),
            )
        })?;

    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
}
