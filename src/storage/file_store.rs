//! Directory-backed storage
//!
//! Every file lives directly under the storage root. Writes go straight to
//! the final path, so a crash mid-write can leave a truncated file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

use super::backend::{is_listable, validate_filename, Backend};

/// File storage rooted at a single directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding every stored file
    root: PathBuf,
}

impl FileStore {
    /// Open the store, creating the root directory if it doesn't exist
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        tracing::debug!("Storage root ready at {}", root.display());
        Ok(Self { root })
    }

    /// Get the storage root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a validated filename to its path under the root
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }
}

impl Backend for FileStore {
    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Non UTF-8 names cannot travel in a JSON string; skip them
            if let Some(name) = entry.file_name().to_str() {
                if is_listable(name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn get(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.resolve(filename)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VaultError::NotFound(filename.to_string()),
            _ => VaultError::Io(e),
        })
    }

    fn put(&self, filename: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(filename)?;
        fs::write(&path, data)?;
        Ok(())
    }

    fn delete(&self, filename: &str) -> Result<()> {
        let path = self.resolve(filename)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VaultError::NotFound(filename.to_string()),
            _ => VaultError::Io(e),
        })
    }
}
