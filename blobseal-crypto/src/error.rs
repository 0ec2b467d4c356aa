//! Envelope-encryption error types.

use thiserror::Error;

/// Result type for envelope-encryption operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while encrypting or decrypting a blob.
///
/// Every failure surfaces to the immediate caller with its specific kind;
/// nothing is swallowed or retried inside the core. Retries belong to the
/// I/O layer, not the cryptographic layer.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The resolver has no key registered under the metadata's key id.
    /// Recoverable by registering the correct key and retrying.
    #[error("no key registered for id {0}")]
    KeyNotFound(String),

    /// The metadata names an algorithm this implementation cannot perform.
    /// Fatal for that blob.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A private-key operation was requested on a key holding only the
    /// public half.
    #[error("key {0} has no private material for unwrap")]
    KeyMaterialMissing(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// AEAD tag mismatch: the ciphertext or metadata was tampered with or
    /// corrupted. Distinct from misconfiguration on purpose.
    #[error("integrity check failed: ciphertext or metadata was modified")]
    IntegrityCheckFailed,

    /// The encryption metadata attribute is missing, truncated, or not
    /// valid JSON. Without it the blob is undecryptable.
    #[error("invalid encryption metadata: {0}")]
    InvalidMetadata(String),

    /// Key generation, import, or export failed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
