//! Engine Module
//!
//! Routes decoded commands to the storage backend.
//!
//! ## Responsibilities
//! - Map each [`Command`] variant to exactly one backend call
//! - Turn backend results into [`Response`] values
//! - Leave error-to-response conversion to the connection handler

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::storage::{Backend, FileStore};

/// Command router shared by every worker
///
/// ## Concurrency Model
/// The engine holds no mutable state of its own. Every call goes straight
/// to the backend, which must tolerate concurrent invocation. Operations
/// on the same filename from different connections are not ordered.
#[derive(Clone)]
pub struct Engine {
    backend: Arc<dyn Backend>,
}

impl Engine {
    /// Create an engine over any backend
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Open a directory-backed engine, creating the root if needed
    pub fn open(storage_root: &Path) -> Result<Self> {
        let store = FileStore::open(storage_root)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::List => {
                let names = self.backend.list()?;
                Ok(Response::list(names))
            }
            Command::Get { filename } => {
                let bytes = self.backend.get(&filename)?;
                Ok(Response::file(filename, &bytes))
            }
            Command::Upload { filename, data } => {
                self.backend.put(&filename, &data)?;
                tracing::debug!("Stored {} ({} bytes)", filename, data.len());
                Ok(Response::message(format!("{} uploaded", filename)))
            }
            Command::Delete { filename } => {
                self.backend.delete(&filename)?;
                tracing::debug!("Deleted {}", filename);
                Ok(Response::message(format!("{} deleted", filename)))
            }
        }
    }

    /// Get the backend
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }
}
