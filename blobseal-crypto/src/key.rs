//! Key-encryption key abstraction and the local RSA variant.
//!
//! An [`EnvelopeKey`] can wrap and unwrap content-encryption keys and
//! reports a stable identifier that travels in blob metadata. [`RsaKey`]
//! implements it over a local RSA keypair with OAEP-SHA256; a key built
//! from only the public half can wrap but not unwrap.

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

/// Algorithm used to wrap (encrypt) the content-encryption key.
///
/// The serialized names are wire-stable: they are written into blob
/// metadata, and renaming one would orphan every blob encrypted under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapAlgorithm {
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
}

impl WrapAlgorithm {
    /// Wire name as written into metadata.
    pub fn name(self) -> &'static str {
        match self {
            WrapAlgorithm::RsaOaep256 => "RSA-OAEP-256",
        }
    }

    /// Parses a wire name back into an algorithm.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "RSA-OAEP-256" => Some(WrapAlgorithm::RsaOaep256),
            _ => None,
        }
    }
}

impl fmt::Display for WrapAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key capable of wrapping and unwrapping content-encryption keys.
///
/// This is the capability set the policies depend on: {wrap, unwrap,
/// identifier}. Implementations must be safe to share across threads;
/// both operations are pure CPU-bound computation with no I/O.
pub trait EnvelopeKey: Send + Sync + fmt::Debug {
    /// Stable identifier, unique within a resolver's scope.
    fn id(&self) -> &str;

    /// Encrypts a content-encryption key, returning the wrapped bytes and
    /// the algorithm that produced them.
    fn wrap(&self, cek: &[u8]) -> CryptoResult<(Vec<u8>, WrapAlgorithm)>;

    /// Decrypts a wrapped content-encryption key.
    ///
    /// The returned buffer is zeroized on drop.
    fn unwrap_key(
        &self,
        wrapped: &[u8],
        algorithm: WrapAlgorithm,
    ) -> CryptoResult<Zeroizing<Vec<u8>>>;
}

/// Envelope key backed by a local RSA keypair (OAEP-SHA256 wrap).
///
/// Holds the public key always and the private key optionally: a
/// public-only instance can wrap for a recipient but fails unwrap with
/// [`CryptoError::KeyMaterialMissing`].
#[derive(Debug)]
pub struct RsaKey {
    id: String,
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaKey {
    /// Generates a fresh keypair under the given id.
    pub fn generate(id: impl Into<String>, bits: usize) -> CryptoResult<Self> {
        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::InvalidKey(format!("RSA key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self {
            id: id.into(),
            public,
            private: Some(private),
        })
    }

    /// Builds a key from an existing private key.
    pub fn from_private(id: impl Into<String>, private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self {
            id: id.into(),
            public,
            private: Some(private),
        }
    }

    /// Builds a wrap-only key from a public key.
    pub fn public_only(id: impl Into<String>, public: RsaPublicKey) -> Self {
        Self {
            id: id.into(),
            public,
            private: None,
        }
    }

    /// Returns whether the private half is present (unwrap possible).
    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Exports the private key as PKCS#8 PEM. The buffer is zeroized on drop.
    pub fn to_pkcs8_pem(&self) -> CryptoResult<Zeroizing<String>> {
        let private = self
            .private
            .as_ref()
            .ok_or_else(|| CryptoError::KeyMaterialMissing(self.id.clone()))?;
        private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(format!("PKCS#8 export failed: {e}")))
    }

    /// Imports a private key from PKCS#8 PEM.
    pub fn from_pkcs8_pem(id: impl Into<String>, pem: &str) -> CryptoResult<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidKey(format!("PKCS#8 import failed: {e}")))?;
        Ok(Self::from_private(id, private))
    }

    /// Exports the public key as SPKI PEM.
    pub fn to_public_key_pem(&self) -> CryptoResult<String> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey(format!("SPKI export failed: {e}")))
    }

    /// Imports a wrap-only key from SPKI PEM.
    pub fn from_public_key_pem(id: impl Into<String>, pem: &str) -> CryptoResult<Self> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CryptoError::InvalidKey(format!("SPKI import failed: {e}")))?;
        Ok(Self::public_only(id, public))
    }
}

impl EnvelopeKey for RsaKey {
    fn id(&self) -> &str {
        &self.id
    }

    fn wrap(&self, cek: &[u8]) -> CryptoResult<(Vec<u8>, WrapAlgorithm)> {
        let mut rng = rand::rngs::OsRng;
        let wrapped = self
            .public
            .encrypt(&mut rng, Oaep::new::<Sha256>(), cek)
            .map_err(|e| CryptoError::EncryptionFailed(format!("CEK wrap failed: {e}")))?;
        Ok((wrapped, WrapAlgorithm::RsaOaep256))
    }

    fn unwrap_key(
        &self,
        wrapped: &[u8],
        algorithm: WrapAlgorithm,
    ) -> CryptoResult<Zeroizing<Vec<u8>>> {
        // Exhaustive on purpose: a new wrap algorithm must be handled here.
        match algorithm {
            WrapAlgorithm::RsaOaep256 => {}
        }

        let private = self
            .private
            .as_ref()
            .ok_or_else(|| CryptoError::KeyMaterialMissing(self.id.clone()))?;

        let cek = private
            .decrypt(Oaep::new::<Sha256>(), wrapped)
            .map_err(|e| CryptoError::DecryptionFailed(format!("CEK unwrap failed: {e}")))?;
        Ok(Zeroizing::new(cek))
    }
}
