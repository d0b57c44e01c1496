//! Storage Module
//!
//! Flat-namespace file storage behind the [`Backend`] trait.
//!
//! ## Responsibilities
//! - List, read, write and delete whole files by name
//! - Reject names that would escape the storage root
//! - Report every failure as a [`VaultError`](crate::VaultError), never panic
//!
//! ## Layout
//! ```text
//! {storage_root}/
//!   ├── report.pdf
//!   ├── notes.txt
//!   └── ...          (no subdirectories)
//! ```
//!
//! There is no locking across operations. Concurrent writers to the same
//! name race at the file-system level and the last writer wins.

mod backend;
mod file_store;
mod memory;

pub use backend::{is_listable, validate_filename, Backend};
pub use file_store::FileStore;
pub use memory::MemoryStore;
