//! Encryption metadata and its attribute round-trip.
//!
//! Everything needed to decrypt a blob — except the private key — travels
//! beside the ciphertext as a single descriptive attribute holding JSON.
//! Losing the attribute makes the blob permanently undecryptable, so the
//! writer always stores the two as a unit.

use crate::error::{CryptoError, CryptoResult};
use crate::key::WrapAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute key under which [`EncryptionMetadata`] is stored.
pub const ENCRYPTION_ATTRIBUTE: &str = "encryptiondata";

/// Symmetric algorithm used for the blob content.
///
/// Wire-stable names, same rules as [`WrapAlgorithm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncryptionAlgorithm {
    #[serde(rename = "A256GCM")]
    Aes256Gcm,
}

impl EncryptionAlgorithm {
    /// Wire name as written into metadata.
    pub fn name(self) -> &'static str {
        match self {
            EncryptionAlgorithm::Aes256Gcm => "A256GCM",
        }
    }

    /// Parses a wire name back into an algorithm.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A256GCM" => Some(EncryptionAlgorithm::Aes256Gcm),
            _ => None,
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the reader needs to reverse an envelope encryption.
///
/// Invariant: `key_id` must resolve to a key capable of unwrapping
/// `wrapped_key` under `wrap_algorithm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Identifier of the key-encryption key.
    pub key_id: String,
    /// CEK encrypted under the key-encryption key.
    #[serde(with = "b64")]
    pub wrapped_key: Vec<u8>,
    pub wrap_algorithm: WrapAlgorithm,
    /// Nonce for the content cipher (12 bytes for AES-256-GCM).
    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
    pub encryption_algorithm: EncryptionAlgorithm,
}

impl EncryptionMetadata {
    /// Serializes to the JSON attribute value.
    pub fn to_attribute(&self) -> CryptoResult<String> {
        serde_json::to_string(self)
            .map_err(|e| CryptoError::InvalidMetadata(format!("serialization failed: {e}")))
    }

    /// Parses the JSON attribute value.
    ///
    /// An unknown algorithm name is reported as
    /// [`CryptoError::UnsupportedAlgorithm`]; any other defect in the
    /// attribute is [`CryptoError::InvalidMetadata`].
    pub fn from_attribute(value: &str) -> CryptoResult<Self> {
        match serde_json::from_str(value) {
            Ok(metadata) => Ok(metadata),
            Err(e) => Err(classify_parse_error(value, e)),
        }
    }

    /// Inserts the metadata into a blob attribute map.
    pub fn to_attributes(&self, attributes: &mut HashMap<String, String>) -> CryptoResult<()> {
        attributes.insert(ENCRYPTION_ATTRIBUTE.to_string(), self.to_attribute()?);
        Ok(())
    }

    /// Extracts the metadata from a blob attribute map.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> CryptoResult<Self> {
        let value = attributes.get(ENCRYPTION_ATTRIBUTE).ok_or_else(|| {
            CryptoError::InvalidMetadata(format!("missing {ENCRYPTION_ATTRIBUTE} attribute"))
        })?;
        Self::from_attribute(value)
    }
}

/// Distinguishes "well-formed metadata naming an algorithm we don't have"
/// from garbled metadata, so callers see the actionable error kind.
fn classify_parse_error(value: &str, err: serde_json::Error) -> CryptoError {
    #[derive(Deserialize)]
    struct Wire {
        wrap_algorithm: String,
        encryption_algorithm: String,
    }

    if let Ok(wire) = serde_json::from_str::<Wire>(value) {
        if WrapAlgorithm::from_name(&wire.wrap_algorithm).is_none() {
            return CryptoError::UnsupportedAlgorithm(wire.wrap_algorithm);
        }
        if EncryptionAlgorithm::from_name(&wire.encryption_algorithm).is_none() {
            return CryptoError::UnsupportedAlgorithm(wire.encryption_algorithm);
        }
    }
    CryptoError::InvalidMetadata(err.to_string())
}

mod b64 {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
