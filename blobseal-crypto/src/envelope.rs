//! Envelope encryption policies for blob payloads.
//!
//! The writer generates a fresh AES-256-GCM content-encryption key (CEK)
//! and nonce per call, encrypts the payload, and wraps the CEK with the
//! caller's envelope key. The reader resolves the wrapping key by the id
//! carried in metadata, unwraps the CEK, and opens the ciphertext.
//!
//! Both functions are stateless: no key state is read from anywhere but
//! the arguments, so unlimited concurrent calls are safe. CEK buffers are
//! zeroized on every exit path, including errors.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EnvelopeKey;
use crate::metadata::{EncryptionAlgorithm, EncryptionMetadata};
use crate::resolver::KeyResolver;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Content-encryption key size (AES-256).
pub const CEK_SIZE: usize = 32;
/// AES-GCM nonce size.
pub const NONCE_SIZE: usize = 12;
/// AES-GCM authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Ciphertext plus the metadata required to decrypt it.
///
/// The two travel as a unit: the storage layer persists the metadata as a
/// blob attribute next to the ciphertext.
#[derive(Debug, Clone)]
pub struct EncryptedBlob {
    pub ciphertext: Vec<u8>,
    pub metadata: EncryptionMetadata,
}

/// Encrypts a payload under a fresh CEK wrapped with `key`.
///
/// Ciphertext length is always `plaintext.len() + TAG_SIZE`.
pub fn encrypt(plaintext: &[u8], key: &dyn EnvelopeKey) -> CryptoResult<EncryptedBlob> {
    let mut cek = Zeroizing::new([0u8; CEK_SIZE]);
    OsRng.fill_bytes(&mut *cek);

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cek.as_slice()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed("AES-GCM rejected the payload".to_string()))?;

    let (wrapped_key, wrap_algorithm) = key.wrap(cek.as_slice())?;

    Ok(EncryptedBlob {
        ciphertext,
        metadata: EncryptionMetadata {
            key_id: key.id().to_string(),
            wrapped_key,
            wrap_algorithm,
            nonce: nonce.to_vec(),
            encryption_algorithm: EncryptionAlgorithm::Aes256Gcm,
        },
    })
}

/// Decrypts a blob using the key the resolver holds for its metadata id.
///
/// A resolver miss is reported as [`CryptoError::KeyNotFound`] before any
/// cryptography runs — wrong or rotated keys are the dominant real-world
/// failure and must stay distinguishable from tampering.
pub fn decrypt(blob: &EncryptedBlob, resolver: &KeyResolver) -> CryptoResult<Vec<u8>> {
    let metadata = &blob.metadata;
    let key = resolver.resolve(&metadata.key_id)?;

    let cek = key.unwrap_key(&metadata.wrapped_key, metadata.wrap_algorithm)?;
    if cek.len() != CEK_SIZE {
        return Err(CryptoError::DecryptionFailed(format!(
            "unwrapped CEK has {} bytes, expected {CEK_SIZE}",
            cek.len()
        )));
    }
    if metadata.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidMetadata(format!(
            "nonce has {} bytes, expected {NONCE_SIZE}",
            metadata.nonce.len()
        )));
    }

    match metadata.encryption_algorithm {
        EncryptionAlgorithm::Aes256Gcm => {}
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(cek.as_slice()));
    cipher
        .decrypt(Nonce::from_slice(&metadata.nonce), blob.ciphertext.as_slice())
        .map_err(|_| CryptoError::IntegrityCheckFailed)
}
