//! Thread-safe registry mapping key ids to envelope keys.
//!
//! The decrypt path reads keys from this resolver to unwrap the CEK
//! carried in blob metadata. The application layer populates it at setup
//! time; decryption only ever reads.

use crate::error::{CryptoError, CryptoResult};
use crate::key::EnvelopeKey;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe key-id to envelope-key resolver.
///
/// Reads are concurrent; registration takes the write lock and is expected
/// to happen rarely, at setup time.
#[derive(Clone)]
pub struct KeyResolver {
    keys: Arc<RwLock<HashMap<String, Arc<dyn EnvelopeKey>>>>,
}

impl KeyResolver {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a key, replacing any existing entry with the same id.
    pub fn register(&self, key: Arc<dyn EnvelopeKey>) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.id().to_string(), key);
    }

    /// Looks up the key for an id.
    pub fn resolve(&self, id: &str) -> CryptoResult<Arc<dyn EnvelopeKey>> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound(id.to_string()))
    }

    /// Removes a key (e.g. after rotation), returning it if present.
    pub fn remove(&self, id: &str) -> Option<Arc<dyn EnvelopeKey>> {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Returns the number of registered keys.
    pub fn len(&self) -> usize {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new()
    }
}
