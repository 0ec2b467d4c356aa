use blobseal_crypto::{
    CryptoError, EncryptionAlgorithm, EnvelopeKey, RsaKey, WrapAlgorithm,
};
use std::sync::{Arc, OnceLock};

fn test_key() -> Arc<RsaKey> {
    static KEY: OnceLock<Arc<RsaKey>> = OnceLock::new();
    KEY.get_or_init(|| Arc::new(RsaKey::generate("pem:key", 2048).unwrap()))
        .clone()
}

#[test]
fn wrap_unwrap_roundtrip() {
    let key = test_key();
    let cek = [0x42u8; 32];

    let (wrapped, algorithm) = key.wrap(&cek).unwrap();
    assert_eq!(algorithm, WrapAlgorithm::RsaOaep256);
    // RSA-2048 output is one modulus-sized block
    assert_eq!(wrapped.len(), 256);

    let unwrapped = key.unwrap_key(&wrapped, algorithm).unwrap();
    assert_eq!(unwrapped.as_slice(), &cek);
}

#[test]
fn wrapping_is_randomized() {
    let key = test_key();
    let cek = [0x42u8; 32];

    let (wrapped1, _) = key.wrap(&cek).unwrap();
    let (wrapped2, _) = key.wrap(&cek).unwrap();
    assert_ne!(wrapped1, wrapped2, "OAEP must randomize each wrap");
}

#[test]
fn private_pem_roundtrip_preserves_unwrap() {
    let key = test_key();
    let pem = key.to_pkcs8_pem().unwrap();

    let imported = RsaKey::from_pkcs8_pem("pem:key", &pem).unwrap();
    assert_eq!(imported.id(), "pem:key");
    assert!(imported.has_private());

    let (wrapped, algorithm) = key.wrap(&[7u8; 32]).unwrap();
    let unwrapped = imported.unwrap_key(&wrapped, algorithm).unwrap();
    assert_eq!(unwrapped.as_slice(), &[7u8; 32]);
}

#[test]
fn public_pem_exports_wrap_only_key() {
    let key = test_key();
    let pem = key.to_public_key_pem().unwrap();

    let public = RsaKey::from_public_key_pem("pem:key", &pem).unwrap();
    assert!(!public.has_private());

    // Wrapped by the public half, unwrapped by the private half
    let (wrapped, algorithm) = public.wrap(&[9u8; 32]).unwrap();
    let unwrapped = key.unwrap_key(&wrapped, algorithm).unwrap();
    assert_eq!(unwrapped.as_slice(), &[9u8; 32]);

    // The wrap-only key cannot export private material
    let err = public.to_pkcs8_pem().unwrap_err();
    assert!(matches!(err, CryptoError::KeyMaterialMissing(_)));
}

#[test]
fn bad_pem_is_rejected() {
    let err = RsaKey::from_pkcs8_pem("bad", "-----BEGIN GARBAGE-----").unwrap_err();
    assert!(matches!(err, CryptoError::InvalidKey(_)));

    let err = RsaKey::from_public_key_pem("bad", "not pem").unwrap_err();
    assert!(matches!(err, CryptoError::InvalidKey(_)));
}

#[test]
fn algorithm_wire_names_are_stable() {
    assert_eq!(WrapAlgorithm::RsaOaep256.name(), "RSA-OAEP-256");
    assert_eq!(WrapAlgorithm::from_name("RSA-OAEP-256"), Some(WrapAlgorithm::RsaOaep256));
    assert_eq!(WrapAlgorithm::from_name("RSA1_5"), None);

    assert_eq!(EncryptionAlgorithm::Aes256Gcm.name(), "A256GCM");
    assert_eq!(EncryptionAlgorithm::from_name("A256GCM"), Some(EncryptionAlgorithm::Aes256Gcm));
    assert_eq!(EncryptionAlgorithm::from_name("A256CBC"), None);

    // serde uses the same names
    assert_eq!(
        serde_json::to_string(&WrapAlgorithm::RsaOaep256).unwrap(),
        "\"RSA-OAEP-256\""
    );
    assert_eq!(
        serde_json::to_string(&EncryptionAlgorithm::Aes256Gcm).unwrap(),
        "\"A256GCM\""
    );
}
