//! In-memory storage
//!
//! Same contract as [`FileStore`](super::FileStore) without touching disk.
//! Handy for tests and for embedding the service.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Result, VaultError};

use super::backend::{is_listable, validate_filename, Backend};

/// HashMap-backed store
///
/// ## Concurrency:
/// - `files`: RwLock (many concurrent readers, exclusive writer)
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files, listable or not
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Backend for MemoryStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .files
            .read()
            .keys()
            .filter(|name| is_listable(name))
            .cloned()
            .collect())
    }

    fn get(&self, filename: &str) -> Result<Vec<u8>> {
        validate_filename(filename)?;
        self.files
            .read()
            .get(filename)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(filename.to_string()))
    }

    fn put(&self, filename: &str, data: &[u8]) -> Result<()> {
        validate_filename(filename)?;
        self.files.write().insert(filename.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, filename: &str) -> Result<()> {
        validate_filename(filename)?;
        self.files
            .write()
            .remove(filename)
            .map(|_| ())
            .ok_or_else(|| VaultError::NotFound(filename.to_string()))
    }
}
