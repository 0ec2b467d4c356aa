//! Encrypted upload/download orchestration.
//!
//! Glues the envelope policies to a [`BlobStore`]: upload encrypts and
//! stores ciphertext with the metadata attribute, download retrieves and
//! decrypts. The client itself holds no key state; the key and resolver
//! are arguments to each call.

use crate::{Attributes, BlobStore, BlobStoreResult};
use blobseal_crypto::{EncryptedBlob, EncryptionMetadata, EnvelopeKey, KeyResolver};
use std::sync::Arc;
use tracing::debug;

/// Client-side encryption front for a blob store.
pub struct EncryptedBlobClient {
    store: Arc<dyn BlobStore>,
}

impl EncryptedBlobClient {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Encrypts `plaintext` under a fresh CEK wrapped with `key` and
    /// stores ciphertext plus metadata as one unit.
    pub fn upload(
        &self,
        namespace: &str,
        name: &str,
        plaintext: &[u8],
        key: &dyn EnvelopeKey,
    ) -> BlobStoreResult<()> {
        let blob = blobseal_crypto::encrypt(plaintext, key)?;

        let mut attributes = Attributes::new();
        blob.metadata.to_attributes(&mut attributes)?;
        self.store
            .put(namespace, name, &blob.ciphertext, &attributes)?;

        debug!(
            namespace,
            name,
            key_id = key.id(),
            ciphertext_len = blob.ciphertext.len(),
            "uploaded encrypted blob"
        );
        Ok(())
    }

    /// Retrieves a blob, reads its metadata attribute, and decrypts using
    /// the key the resolver holds for the metadata's key id.
    pub fn download(
        &self,
        namespace: &str,
        name: &str,
        resolver: &KeyResolver,
    ) -> BlobStoreResult<Vec<u8>> {
        let (ciphertext, attributes) = self.store.get(namespace, name)?;
        let metadata = EncryptionMetadata::from_attributes(&attributes)?;

        debug!(
            namespace,
            name,
            key_id = %metadata.key_id,
            ciphertext_len = ciphertext.len(),
            "downloaded encrypted blob"
        );

        let blob = EncryptedBlob {
            ciphertext,
            metadata,
        };
        Ok(blobseal_crypto::decrypt(&blob, resolver)?)
    }

    /// Deletes a blob and its metadata.
    pub fn delete(&self, namespace: &str, name: &str) -> BlobStoreResult<()> {
        self.store.delete(namespace, name)
    }
}
