//! Deterministic field cipher: AES-128, ECB mode, PKCS#7 padding, base64.
//!
//! No IV is used, so identical plaintexts under one key produce identical
//! ciphertext. This keeps stored values equality-searchable and readable by
//! existing consumers, at the cost of semantic security. New deployments
//! that do not need equality lookups should use the sealed mode.

use crate::error::{CryptoError, CryptoResult};
use crate::key::FieldKey;
use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Encrypts a field value. Empty input is returned unchanged.
pub fn encrypt(plaintext: &str, key: &FieldKey) -> CryptoResult<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }
    let bytes = encrypt_bytes(plaintext.as_bytes(), key)?;
    Ok(STANDARD.encode(bytes))
}

/// Decrypts a field value. Empty input is returned unchanged.
pub fn decrypt(ciphertext: &str, key: &FieldKey) -> CryptoResult<String> {
    if ciphertext.is_empty() {
        return Ok(String::new());
    }
    let raw = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
    let plaintext = decrypt_bytes(&raw, key)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))
}

/// [`encrypt`] for optional values; `None` passes through.
pub fn encrypt_opt(plaintext: Option<&str>, key: &FieldKey) -> CryptoResult<Option<String>> {
    plaintext.map(|p| encrypt(p, key)).transpose()
}

/// [`decrypt`] for optional values; `None` passes through.
pub fn decrypt_opt(ciphertext: Option<&str>, key: &FieldKey) -> CryptoResult<Option<String>> {
    ciphertext.map(|c| decrypt(c, key)).transpose()
}

fn block_cipher(key: &FieldKey) -> Result<Aes128, aes::cipher::InvalidLength> {
    Aes128::new_from_slice(key.as_bytes())
}

fn encrypt_bytes(data: &[u8], key: &FieldKey) -> CryptoResult<Vec<u8>> {
    let cipher = block_cipher(key)
        .map_err(|e| CryptoError::Encryption(format!("cipher rejected key: {e}")))?;

    let mut buf = pkcs7_pad(data);
    for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(aes::Block::from_mut_slice(chunk));
    }
    Ok(buf)
}

fn decrypt_bytes(data: &[u8], key: &FieldKey) -> CryptoResult<Vec<u8>> {
    if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption(format!(
            "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
            data.len()
        )));
    }
    let cipher = block_cipher(key)
        .map_err(|e| CryptoError::Decryption(format!("cipher rejected key: {e}")))?;

    let mut buf = data.to_vec();
    for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(aes::Block::from_mut_slice(chunk));
    }
    pkcs7_unpad(buf)
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad = BLOCK_SIZE - data.len() % BLOCK_SIZE;
    let mut buf = Vec::with_capacity(data.len() + pad);
    buf.extend_from_slice(data);
    buf.resize(data.len() + pad, pad as u8);
    buf
}

fn pkcs7_unpad(mut buf: Vec<u8>) -> CryptoResult<Vec<u8>> {
    let bad_padding =
        || CryptoError::Decryption("bad padding (wrong key or corrupted data)".to_string());

    let pad = *buf.last().ok_or_else(bad_padding)? as usize;
    if pad == 0 || pad > BLOCK_SIZE || pad > buf.len() {
        return Err(bad_padding());
    }
    if !buf[buf.len() - pad..].iter().all(|&b| b as usize == pad) {
        return Err(bad_padding());
    }
    buf.truncate(buf.len() - pad);
    Ok(buf)
}
