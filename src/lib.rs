//! # FileVault
//!
//! A remote file-storage service with:
//! - A delimited text protocol (`LIST`, `GET`, `UPLOAD`, `DELETE`)
//! - JSON responses with base64 file payloads
//! - Three concurrency policies: single-threaded, thread pool, process pool
//! - A flat, directory-backed storage namespace
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Concurrency Supervisor                       │
//! │          (single | thread pool | process pool)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one accepted socket per worker
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection Handler                           │
//! │      Framer → Codec → Engine → Codec → write → close         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │   Engine    │  (Command → backend call)
//!                └──────┬──────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │   Storage   │  (flat directory)
//!                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod storage;
pub mod network;
pub mod protocol;
pub mod engine;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{VaultError, Result};
pub use config::{Config, Mode};
pub use engine::Engine;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FileVault
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
