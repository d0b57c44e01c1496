//! Configuration for FileVault
//!
//! Centralized configuration with sensible defaults. Values can come from
//! the builder, from an optional TOML file, or both (the binary applies
//! command-line flags on top of the file).

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, VaultError};

/// Default TCP port for the file service
pub const DEFAULT_PORT: u16 = 10001;

/// Default cap on a single request frame (16 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Main configuration for a FileVault server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Supervisor Configuration
    // -------------------------------------------------------------------------
    /// Concurrency policy for accepted connections
    pub mode: Mode,

    /// Worker threads (thread mode) or worker processes (process mode)
    pub workers: usize,

    /// Pending connections the thread pool queues before `accept` blocks.
    /// `None` means `workers * 4`.
    pub queue_capacity: Option<usize>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Interface to bind (IP literal or host name)
    pub bind_address: String,

    /// TCP port
    pub port: u16,

    /// Listen backlog passed to the OS
    pub backlog: i32,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every stored file (flat, created if absent)
    pub storage_root: PathBuf,

    /// Largest request frame accepted before the session fails
    pub max_frame_size: usize,

    // -------------------------------------------------------------------------
    // Logging Configuration
    // -------------------------------------------------------------------------
    /// Default `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,

    /// Optional file receiving a copy of every log line (appended)
    pub log_file: Option<PathBuf>,
}

/// How the supervisor distributes accepted connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Handle each connection inline before accepting the next
    Single,

    /// Hand connections to a bounded pool of worker threads
    Thread,

    /// Pre-fork worker processes sharing the port via SO_REUSEPORT
    Process,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Single => "single",
            Mode::Thread => "thread",
            Mode::Process => "process",
        };
        f.write_str(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Thread,
            workers: 20,
            queue_capacity: None,
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: 128,
            read_timeout_ms: 30_000,
            write_timeout_ms: 30_000,
            storage_root: PathBuf::from("./files"),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load a config from a TOML file, starting from the defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaultError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(contents)
            .map_err(|e| VaultError::Config(format!("invalid TOML: {}", e)))?;
        let mut config = Config::default();
        file.apply(&mut config);
        Ok(config)
    }

    /// Effective capacity of the thread-pool submission queue
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or_else(|| self.workers.saturating_mul(4))
    }

    /// `bind_address:port` as a string suitable for socket resolution
    pub fn listen_addr(&self) -> String {
        if self.bind_address.contains(':') && !self.bind_address.starts_with('[') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }

    /// Resolve the listen address to a concrete socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        use std::net::ToSocketAddrs;

        self.listen_addr()
            .to_socket_addrs()
            .map_err(|e| VaultError::Config(format!("cannot resolve {}: {}", self.listen_addr(), e)))?
            .next()
            .ok_or_else(|| VaultError::Config(format!("no address for {}", self.listen_addr())))
    }

    /// Reject settings the supervisor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(VaultError::Config("workers must be at least 1".to_string()));
        }
        if self.max_frame_size == 0 {
            return Err(VaultError::Config("max_frame_size must be positive".to_string()));
        }
        if self.queue_capacity == Some(0) {
            return Err(VaultError::Config("queue_capacity must be positive".to_string()));
        }
        if self.storage_root.as_os_str().is_empty() {
            return Err(VaultError::Config("storage_root must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the concurrency policy
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the number of worker threads or processes
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the thread-pool queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Set the interface to bind
    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.config.bind_address = addr.into();
        self
    }

    /// Set the TCP port (0 picks an ephemeral port)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the listen backlog
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.config.backlog = backlog;
        self
    }

    /// Set the storage root directory
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Set the maximum request frame size (in bytes)
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the default log filter directive
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Also write logs to `path`
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// TOML File Layout
// =============================================================================

/// On-disk configuration layout; every key is optional
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub mode: Option<Mode>,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub backlog: Option<i32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub root: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    pub max_frame_size: Option<usize>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: Option<String>,
    /// Log file appended to alongside stdout
    pub file: Option<PathBuf>,
}

impl TomlConfig {
    fn apply(self, config: &mut Config) {
        let TomlConfig { server, storage, limits, logging } = self;

        if let Some(mode) = server.mode {
            config.mode = mode;
        }
        if let Some(workers) = server.workers {
            config.workers = workers;
        }
        if server.queue_capacity.is_some() {
            config.queue_capacity = server.queue_capacity;
        }
        if let Some(addr) = server.bind_address {
            config.bind_address = addr;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(backlog) = server.backlog {
            config.backlog = backlog;
        }
        if let Some(root) = storage.root {
            config.storage_root = root;
        }
        if let Some(size) = limits.max_frame_size {
            config.max_frame_size = size;
        }
        if let Some(ms) = limits.read_timeout_ms {
            config.read_timeout_ms = ms;
        }
        if let Some(ms) = limits.write_timeout_ms {
            config.write_timeout_ms = ms;
        }
        if let Some(level) = logging.level {
            config.log_level = level;
        }
        if logging.file.is_some() {
            config.log_file = logging.file;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Thread);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.queue_capacity(), 80);
        assert_eq!(config.listen_addr(), "0.0.0.0:10001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_parsing() {
        let config = Config::from_toml_str(
            r#"
            [server]
            mode = "process"
            workers = 4
            port = 9000

            [storage]
            root = "/tmp/vault"

            [limits]
            max_frame_size = 1024
            read_timeout_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Process);
        assert_eq!(config.workers, 4);
        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_root, PathBuf::from("/tmp/vault"));
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.read_timeout_ms, 0);
        // untouched keys keep defaults
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.write_timeout_ms, 30_000);
    }

    #[test]
    fn test_toml_rejects_unknown_mode() {
        let err = Config::from_toml_str("[server]\nmode = \"fork\"\n").unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = Config::builder().workers(0).build();
        assert!(matches!(config.validate(), Err(VaultError::Config(_))));

        let config = Config::builder().queue_capacity(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_logging_section() {
        let config = Config::from_toml_str(
            "[logging]\nlevel = \"debug\"\nfile = \"/var/log/filevault.log\"\n",
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/filevault.log")));
        assert_eq!(Config::default().log_file, None);
    }

    #[test]
    fn test_queue_capacity_saturates() {
        let config = Config::builder().workers(usize::MAX).build();
        assert_eq!(config.queue_capacity(), usize::MAX);
    }

    #[test]
    fn test_ipv6_listen_addr() {
        let config = Config::builder().bind_address("::1").port(7).build();
        assert_eq!(config.listen_addr(), "[::1]:7");
    }
}
