//! Backend trait and the filename rules every backend shares.

use crate::error::{Result, VaultError};

/// A flat file namespace with four whole-file operations
///
/// Implementations must be safe to call from many worker threads at once.
pub trait Backend: Send + Sync {
    /// Names of every stored file that has an extension (`*.*`)
    fn list(&self) -> Result<Vec<String>>;

    /// Entire contents of `filename`
    fn get(&self, filename: &str) -> Result<Vec<u8>>;

    /// Create or overwrite `filename` with `data`
    fn put(&self, filename: &str, data: &[u8]) -> Result<()>;

    /// Remove `filename`
    fn delete(&self, filename: &str) -> Result<()>;
}

/// Check that `filename` names a single entry directly under the root
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(VaultError::EmptyFilename);
    }

    let traversal = filename == "." || filename == "..";
    let bad_char = filename
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_whitespace());

    if traversal || bad_char {
        return Err(VaultError::InvalidFilename(filename.to_string()));
    }

    Ok(())
}

/// Whether `filename` matches the `*.*` listing pattern
///
/// Like a shell glob, `*` does not match a leading dot, so hidden files
/// are never listed.
pub fn is_listable(filename: &str) -> bool {
    !filename.starts_with('.') && filename.contains('.')
}
