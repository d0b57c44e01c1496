//! Connection Handler
//!
//! Handles individual client connections.
//!
//! A session is one request and one response: read a frame, decode it,
//! run it through the engine, write the framed reply, close. Every failure
//! below this point turns into an ERROR response or a quiet close; nothing
//! escapes to the accept loop.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, VaultError};
use crate::protocol::{decode_command, write_response, FrameReader, Response};

/// Message sent when request processing fails unexpectedly
const UNRECOGNIZED: &str = "request not recognized";

/// Per-connection limits derived from [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    /// Largest request frame accepted
    pub max_frame_size: usize,

    /// Read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,
}

impl From<&Config> for ConnectionOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_frame_size: config.max_frame_size,
            read_timeout_ms: config.read_timeout_ms,
            write_timeout_ms: config.write_timeout_ms,
        }
    }
}

/// Handles a single client connection
pub struct Connection<S> {
    /// Client stream (socket in production, any duplex in tests)
    stream: S,

    /// Accumulates request bytes until the delimiter
    framer: FrameReader,

    /// Reference to the command router
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection<TcpStream> {
    /// Wrap an accepted socket
    ///
    /// Disables Nagle's algorithm and applies the configured timeouts.
    pub fn accept(stream: TcpStream, engine: Arc<Engine>, options: &ConnectionOptions) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout(options.read_timeout_ms))?;
        stream.set_write_timeout(timeout(options.write_timeout_ms))?;

        Ok(Self::with_stream(stream, engine, peer_addr, options.max_frame_size))
    }

    /// Run one session on `stream` and close it, whatever happens
    pub fn serve(stream: TcpStream, engine: Arc<Engine>, options: &ConnectionOptions) {
        let mut connection = match Self::accept(stream, engine, options) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                return;
            }
        };

        if let Err(e) = connection.handle() {
            tracing::debug!("Session with {} ended with error: {}", connection.peer_addr, e);
        }
        connection.close();
    }

    /// Shut the socket down in both directions
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        tracing::debug!("Connection to {} closed", self.peer_addr);
    }
}

impl<S: Read + Write> Connection<S> {
    /// Create a connection over an arbitrary duplex stream
    pub fn with_stream(
        stream: S,
        engine: Arc<Engine>,
        peer_addr: impl Into<String>,
        max_frame_size: usize,
    ) -> Self {
        Self {
            stream,
            framer: FrameReader::new(max_frame_size),
            engine,
            peer_addr: peer_addr.into(),
        }
    }

    /// Handle the connection (blocking until one exchange completes)
    ///
    /// Returns `Ok(())` when a response was sent or the peer left before
    /// sending a full request. Errors are transport failures or an
    /// oversized frame; in the latter case an ERROR frame is attempted first.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let frame = match self.framer.read_frame(&mut self.stream) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!("Client {} disconnected before sending a request", self.peer_addr);
                return Ok(());
            }
            Err(e @ VaultError::FrameTooLarge { .. }) => {
                tracing::warn!("Rejecting request from {}: {}", self.peer_addr, e);
                let _ = self.send_response(&Response::error(e.to_string()));
                return Err(e);
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!("Client {} went away: {}", self.peer_addr, e);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                return Err(e);
            }
        };

        let response = self.process(&frame);

        if let Err(e) = self.send_response(&response) {
            if e.is_disconnect() {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr, e
                );
                return Ok(());
            }
            tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
            return Err(e);
        }

        Ok(())
    }

    /// Decode and execute one request frame
    fn process(&self, frame: &[u8]) -> Response {
        let command = match decode_command(frame) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!("Bad request from {}: {}", self.peer_addr, e);
                return Response::error(e.to_string());
            }
        };

        tracing::info!(
            "{} {} from {}",
            command.verb().as_str(),
            command.filename().unwrap_or("-"),
            self.peer_addr
        );

        let engine = &self.engine;
        match panic::catch_unwind(AssertUnwindSafe(|| engine.execute(command))) {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::debug!("Request from {} failed: {}", self.peer_addr, e);
                Response::error(e.to_string())
            }
            Err(_) => {
                tracing::error!("Request from {} panicked", self.peer_addr);
                Response::error(UNRECOGNIZED)
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_response(&mut self.stream, response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn timeout(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}
