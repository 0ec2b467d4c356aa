use blobseal_blobstore::{
    BlobStore, BlobStoreError, EncryptedBlobClient, FileBlobStore, MemoryBlobStore,
};
use blobseal_crypto::{CryptoError, KeyResolver, RsaKey};
use std::sync::{Arc, OnceLock};

const DEMO_MESSAGE: &[u8] = b"Brace yourselves.  Winter is coming.";

fn demo_key() -> Arc<RsaKey> {
    static KEY: OnceLock<Arc<RsaKey>> = OnceLock::new();
    KEY.get_or_init(|| Arc::new(RsaKey::generate("private:key1", 2048).unwrap()))
        .clone()
}

fn resolver_with(key: Arc<RsaKey>) -> KeyResolver {
    let resolver = KeyResolver::new();
    resolver.register(key);
    resolver
}

#[test]
fn upload_download_roundtrip_in_memory() {
    let key = demo_key();
    let store = Arc::new(MemoryBlobStore::new());
    let client = EncryptedBlobClient::new(store.clone());

    client.upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref()).unwrap();

    // The stored bytes are ciphertext, not the message
    let (stored, attributes) = store.get("dublin", "blockblob").unwrap();
    assert_ne!(stored.as_slice(), DEMO_MESSAGE);
    assert!(attributes.contains_key(blobseal_crypto::ENCRYPTION_ATTRIBUTE));

    let plaintext = client.download("dublin", "blockblob", &resolver_with(key)).unwrap();
    assert_eq!(plaintext, DEMO_MESSAGE);
}

#[test]
fn upload_download_roundtrip_on_disk_across_reopen() {
    let key = demo_key();
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FileBlobStore::open(dir.path()).unwrap());
        EncryptedBlobClient::new(store)
            .upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref())
            .unwrap();
    }

    let store = Arc::new(FileBlobStore::open(dir.path()).unwrap());
    let plaintext = EncryptedBlobClient::new(store)
        .download("dublin", "blockblob", &resolver_with(key))
        .unwrap();
    assert_eq!(plaintext, DEMO_MESSAGE);
}

#[test]
fn tampered_stored_ciphertext_fails_integrity() {
    let key = demo_key();
    let store = Arc::new(MemoryBlobStore::new());
    let client = EncryptedBlobClient::new(store.clone());
    client.upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref()).unwrap();

    let (mut stored, attributes) = store.get("dublin", "blockblob").unwrap();
    stored[3] ^= 0x80;
    store.put("dublin", "blockblob", &stored, &attributes).unwrap();

    let err = client
        .download("dublin", "blockblob", &resolver_with(key))
        .unwrap_err();
    assert!(matches!(
        err,
        BlobStoreError::Crypto(CryptoError::IntegrityCheckFailed)
    ));
}

#[test]
fn stripped_metadata_attribute_is_invalid_metadata() {
    let key = demo_key();
    let store = Arc::new(MemoryBlobStore::new());
    let client = EncryptedBlobClient::new(store.clone());
    client.upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref()).unwrap();

    let (stored, mut attributes) = store.get("dublin", "blockblob").unwrap();
    attributes.remove(blobseal_crypto::ENCRYPTION_ATTRIBUTE);
    store.put("dublin", "blockblob", &stored, &attributes).unwrap();

    let err = client
        .download("dublin", "blockblob", &resolver_with(key))
        .unwrap_err();
    assert!(matches!(
        err,
        BlobStoreError::Crypto(CryptoError::InvalidMetadata(_))
    ));
}

#[test]
fn download_with_empty_resolver_is_key_not_found() {
    let key = demo_key();
    let client = EncryptedBlobClient::new(Arc::new(MemoryBlobStore::new()));
    client.upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref()).unwrap();

    let err = client
        .download("dublin", "blockblob", &KeyResolver::new())
        .unwrap_err();
    assert!(matches!(
        err,
        BlobStoreError::Crypto(CryptoError::KeyNotFound(id)) if id == "private:key1"
    ));
}

#[test]
fn delete_removes_encrypted_blob() {
    let key = demo_key();
    let client = EncryptedBlobClient::new(Arc::new(MemoryBlobStore::new()));
    client.upload("dublin", "blockblob", DEMO_MESSAGE, key.as_ref()).unwrap();

    client.delete("dublin", "blockblob").unwrap();
    let err = client
        .download("dublin", "blockblob", &resolver_with(key))
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::NotFound(_, _)));
}
