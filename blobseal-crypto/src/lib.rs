//! Envelope-encryption core for blobseal.
//!
//! Provides client-side encryption for blob payloads using:
//! - AES-256-GCM for authenticated content encryption
//! - RSA-OAEP-SHA256 for wrapping the content-encryption key
//! - A thread-safe resolver mapping key ids to unwrap-capable keys
//!
//! # Architecture
//!
//! Each payload is encrypted with a fresh random content-encryption key
//! (CEK). The CEK is then wrapped with a longer-lived asymmetric key and
//! stored, together with the wrap and content algorithms, the nonce, and
//! the key id, as metadata beside the ciphertext.
//!
//! This envelope scheme means:
//! - The asymmetric key never touches payload bytes
//! - Rotating the asymmetric key never requires re-encrypting payloads
//!   already wrapped under it, only keeping the old key resolvable
//! - The read path needs nothing but the metadata and a resolver holding
//!   the right private key
//!
//! The crate performs no I/O; persistence of ciphertext and metadata is
//! the storage layer's responsibility.

pub mod envelope;
mod error;
mod key;
mod metadata;
mod resolver;

pub use envelope::{CEK_SIZE, EncryptedBlob, NONCE_SIZE, TAG_SIZE, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use key::{EnvelopeKey, RsaKey, WrapAlgorithm};
pub use metadata::{ENCRYPTION_ATTRIBUTE, EncryptionAlgorithm, EncryptionMetadata};
pub use resolver::KeyResolver;
