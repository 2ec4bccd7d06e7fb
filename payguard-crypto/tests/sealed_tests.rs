use payguard_crypto::sealed::{is_sealed, open, seal, NONCE_SIZE, SEALED_PREFIX, TAG_SIZE};
use payguard_crypto::{derive_sealed_key, CryptoError, DerivedKey, KdfParams};

fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

fn test_key() -> DerivedKey {
    derive_sealed_key("payments-pii-key-2026", b"pii-salt-0001", &fast_kdf()).unwrap()
}

#[test]
fn seal_open_roundtrip() {
    let key = test_key();
    let sealed = seal("22212345678", &key).unwrap();
    assert!(is_sealed(&sealed));
    assert_eq!(open(&sealed, &key).unwrap(), "22212345678");
}

#[test]
fn each_seal_produces_different_ciphertext() {
    let key = test_key();
    let a = seal("same value", &key).unwrap();
    let b = seal("same value", &key).unwrap();
    assert_ne!(a, b);
    assert_eq!(open(&a, &key).unwrap(), "same value");
    assert_eq!(open(&b, &key).unwrap(), "same value");
}

#[test]
fn sealed_length_covers_nonce_and_tag() {
    use base64::Engine as _;
    let key = test_key();
    let sealed = seal("abc", &key).unwrap();
    let body = sealed.strip_prefix(SEALED_PREFIX).unwrap();
    let raw = base64::engine::general_purpose::STANDARD.decode(body).unwrap();
    assert_eq!(raw.len(), NONCE_SIZE + 3 + TAG_SIZE);
}

#[test]
fn empty_passes_through() {
    let key = test_key();
    assert_eq!(seal("", &key).unwrap(), "");
    assert_eq!(open("", &key).unwrap(), "");
}

#[test]
fn wrong_key_fails() {
    let sealed = seal("ada@example.com", &test_key()).unwrap();
    let other = derive_sealed_key("another-secret", b"pii-salt-0001", &fast_kdf()).unwrap();
    let err = open(&sealed, &other).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn different_salt_derives_different_key() {
    let a = derive_sealed_key("secret", b"salt-aaaa", &fast_kdf()).unwrap();
    let b = derive_sealed_key("secret", b"salt-bbbb", &fast_kdf()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn derivation_is_stable() {
    let a = derive_sealed_key("secret", b"salt-aaaa", &fast_kdf()).unwrap();
    let b = derive_sealed_key("secret", b"salt-aaaa", &fast_kdf()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn tampered_ciphertext_fails() {
    use base64::Engine as _;
    let engine = base64::engine::general_purpose::STANDARD;
    let key = test_key();
    let sealed = seal("ada@example.com", &key).unwrap();
    let mut raw = engine.decode(sealed.strip_prefix(SEALED_PREFIX).unwrap()).unwrap();
    raw[NONCE_SIZE] ^= 0xFF;
    let tampered = format!("{SEALED_PREFIX}{}", engine.encode(raw));

    let err = open(&tampered, &key).unwrap_err();
    assert!(err.to_string().contains("authentication failed"));
}

#[test]
fn too_short_body_fails() {
    let err = open("s1:AAAA", &test_key()).unwrap_err();
    assert!(err.to_string().contains("too short"));
}

#[test]
fn missing_prefix_fails() {
    let err = open("AAAAAAAAAAAAAAAAAAAAAA==", &test_key()).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn short_salt_is_rejected() {
    let err = derive_sealed_key("secret", b"short", &fast_kdf()).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

#[test]
fn invalid_kdf_params_are_rejected() {
    let params = KdfParams {
        memory_kib: 1,
        iterations: 0,
        parallelism: 1,
    };
    let err = derive_sealed_key("secret", b"salt-aaaa", &params).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}
