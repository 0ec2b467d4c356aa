//! Namespace-scoped blob storage with descriptive attributes.
//!
//! This is the storage collaborator boundary the envelope policies hang
//! off: opaque objects addressed by `(namespace, name)`, each carrying a
//! string key/value attribute map. Encryption metadata rides in those
//! attributes, so a store implementation must round-trip them verbatim.
//!
//! Two implementations are provided: [`MemoryBlobStore`] for tests and
//! demos, and [`FileBlobStore`] persisting each blob as a data file plus
//! a JSON attribute sidecar.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

mod client;

pub use client::EncryptedBlobClient;

// ============================================================================
// Error types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("blob not found: {0}/{1}")]
    NotFound(String, String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Crypto(#[from] blobseal_crypto::CryptoError),
}

pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

// ============================================================================
// Data shapes
// ============================================================================

/// Descriptive key/value pairs stored beside a blob's data.
pub type Attributes = HashMap<String, String>;

#[derive(Debug, Clone, Serialize)]
pub struct BlobInfo {
    pub namespace: String,
    pub name: String,
    pub size: u64,
    pub created_at: i64,
    pub modified_at: i64,
}

// ============================================================================
// BlobStore
// ============================================================================

/// Storage collaborator contract: put/get/delete on named objects, with
/// attributes travelling alongside the data.
pub trait BlobStore: Send + Sync {
    /// Stores a blob, replacing any existing one under the same name.
    fn put(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        attributes: &Attributes,
    ) -> BlobStoreResult<()>;

    /// Reads a blob's data and attributes.
    fn get(&self, namespace: &str, name: &str) -> BlobStoreResult<(Vec<u8>, Attributes)>;

    /// Deletes a blob.
    fn delete(&self, namespace: &str, name: &str) -> BlobStoreResult<()>;

    /// Lists blob info for a namespace, most recently modified first.
    fn list(&self, namespace: &str) -> BlobStoreResult<Vec<BlobInfo>>;
}

fn validate_name(part: &str) -> BlobStoreResult<()> {
    if part.is_empty() || part.contains(['/', '\\']) || part == ".." {
        return Err(BlobStoreError::Storage(format!(
            "invalid namespace or blob name: {part:?}"
        )));
    }
    Ok(())
}

// ============================================================================
// MemoryBlobStore
// ============================================================================

struct MemoryBlob {
    data: Vec<u8>,
    attributes: Attributes,
    created_at: i64,
    modified_at: i64,
}

/// In-memory store for tests and demos.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<(String, String), MemoryBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        attributes: &Attributes,
    ) -> BlobStoreResult<()> {
        validate_name(namespace)?;
        validate_name(name)?;
        let now = Utc::now().timestamp_millis();
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (namespace.to_string(), name.to_string());
        let created_at = blobs.get(&key).map_or(now, |b| b.created_at);
        blobs.insert(
            key,
            MemoryBlob {
                data: data.to_vec(),
                attributes: attributes.clone(),
                created_at,
                modified_at: now,
            },
        );
        Ok(())
    }

    fn get(&self, namespace: &str, name: &str) -> BlobStoreResult<(Vec<u8>, Attributes)> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs
            .get(&(namespace.to_string(), name.to_string()))
            .map(|b| (b.data.clone(), b.attributes.clone()))
            .ok_or_else(|| BlobStoreError::NotFound(namespace.to_string(), name.to_string()))
    }

    fn delete(&self, namespace: &str, name: &str) -> BlobStoreResult<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| BlobStoreError::NotFound(namespace.to_string(), name.to_string()))
    }

    fn list(&self, namespace: &str) -> BlobStoreResult<Vec<BlobInfo>> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items: Vec<BlobInfo> = blobs
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|((ns, name), b)| BlobInfo {
                namespace: ns.clone(),
                name: name.clone(),
                size: b.data.len() as u64,
                created_at: b.created_at,
                modified_at: b.modified_at,
            })
            .collect();
        items.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(items)
    }
}

// ============================================================================
// FileBlobStore
// ============================================================================

/// Sidecar record persisted as `<name>.attrs.json` beside the data file.
#[derive(Serialize, Deserialize)]
struct Sidecar {
    attributes: Attributes,
    created_at: i64,
    modified_at: i64,
}

/// Filesystem store: `<root>/<namespace>/<name>` holds the raw data,
/// `<root>/<namespace>/<name>.attrs.json` the attributes and timestamps.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> BlobStoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        Ok(Self { root })
    }

    fn data_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(name)
    }

    fn sidecar_path(&self, namespace: &str, name: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{name}.attrs.json"))
    }

    fn read_sidecar(&self, namespace: &str, name: &str) -> BlobStoreResult<Sidecar> {
        let raw = fs::read_to_string(self.sidecar_path(namespace, name))
            .map_err(|e| BlobStoreError::Storage(format!("attribute sidecar unreadable: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| BlobStoreError::Storage(format!("attribute sidecar corrupt: {e}")))
    }
}

impl BlobStore for FileBlobStore {
    fn put(
        &self,
        namespace: &str,
        name: &str,
        data: &[u8],
        attributes: &Attributes,
    ) -> BlobStoreResult<()> {
        validate_name(namespace)?;
        validate_name(name)?;
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir).map_err(|e| BlobStoreError::Storage(e.to_string()))?;

        let now = Utc::now().timestamp_millis();
        let created_at = self
            .read_sidecar(namespace, name)
            .map(|s| s.created_at)
            .unwrap_or(now);

        fs::write(self.data_path(namespace, name), data)
            .map_err(|e| BlobStoreError::Storage(e.to_string()))?;

        let sidecar = Sidecar {
            attributes: attributes.clone(),
            created_at,
            modified_at: now,
        };
        let encoded = serde_json::to_string_pretty(&sidecar)
            .map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        fs::write(self.sidecar_path(namespace, name), encoded)
            .map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn get(&self, namespace: &str, name: &str) -> BlobStoreResult<(Vec<u8>, Attributes)> {
        let data = fs::read(self.data_path(namespace, name))
            .map_err(|_| BlobStoreError::NotFound(namespace.to_string(), name.to_string()))?;
        // A data file without its sidecar still resolves; decryption will
        // fail later with a missing-metadata error, not a storage error.
        let attributes = self
            .read_sidecar(namespace, name)
            .map(|s| s.attributes)
            .unwrap_or_default();
        Ok((data, attributes))
    }

    fn delete(&self, namespace: &str, name: &str) -> BlobStoreResult<()> {
        let data_path = self.data_path(namespace, name);
        if !data_path.exists() {
            return Err(BlobStoreError::NotFound(
                namespace.to_string(),
                name.to_string(),
            ));
        }
        fs::remove_file(&data_path).map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        let sidecar = self.sidecar_path(namespace, name);
        if sidecar.exists() {
            fs::remove_file(&sidecar).map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    fn list(&self, namespace: &str) -> BlobStoreResult<Vec<BlobInfo>> {
        let dir = self.root.join(namespace);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| BlobStoreError::Storage(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| BlobStoreError::Storage(e.to_string()))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.ends_with(".attrs.json") {
                continue;
            }
            let meta = entry
                .metadata()
                .map_err(|e| BlobStoreError::Storage(e.to_string()))?;
            let (created_at, modified_at) = match self.read_sidecar(namespace, name) {
                Ok(sidecar) => (sidecar.created_at, sidecar.modified_at),
                Err(_) => (0, 0),
            };
            items.push(BlobInfo {
                namespace: namespace.to_string(),
                name: name.to_string(),
                size: meta.len(),
                created_at,
                modified_at,
            });
        }
        items.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(items)
    }
}
