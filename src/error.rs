//! Error types for FileVault
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

/// Unified error type for FileVault operations
#[derive(Debug, Error)]
pub enum VaultError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("no filename provided")]
    EmptyFilename,

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("invalid command format")]
    InvalidCommand,

    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("frame exceeds size limit of {limit} bytes")]
    FrameTooLarge { limit: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// True for I/O failures caused by the peer going away or stalling.
    ///
    /// These end a session quietly instead of being reported as server faults.
    pub fn is_disconnect(&self) -> bool {
        match self {
            VaultError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
