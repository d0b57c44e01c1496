//! Blocking client
//!
//! Opens a fresh connection per request, matching the server's one-shot
//! sessions. Used by the CLI binary and the integration tests.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Result, VaultError};
use crate::protocol::{read_response, write_command, Command, Response};

/// Largest response frame the client will buffer (256 MB)
pub const MAX_RESPONSE_SIZE: usize = 256 * 1024 * 1024;

/// Client for a FileVault server
#[derive(Debug, Clone)]
pub struct Client {
    /// Server address (host:port)
    addr: String,

    /// Applied to connect, read and write
    timeout: Option<Duration>,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Some(Duration::from_secs(30)),
        }
    }

    /// Override the I/O timeout (`None` waits forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one command and read the server's response
    pub fn request(&self, command: &Command) -> Result<Response> {
        let mut stream = self.connect()?;
        write_command(&mut stream, command)?;
        read_response(&mut stream, MAX_RESPONSE_SIZE)
    }

    /// Send raw request bytes and return everything the server writes back
    pub fn send_raw(&self, request: &[u8]) -> Result<Vec<u8>> {
        let mut stream = self.connect()?;
        stream.write_all(request)?;
        stream.flush()?;
        stream.shutdown(Shutdown::Write)?;

        let mut reply = Vec::new();
        stream.read_to_end(&mut reply)?;
        Ok(reply)
    }

    /// Filenames currently stored
    pub fn list(&self) -> Result<Vec<String>> {
        let response = ok_or_remote(self.request(&Command::List)?)?;
        response
            .names()
            .map(<[String]>::to_vec)
            .ok_or_else(|| unexpected("LIST"))
    }

    /// Contents of `filename`
    pub fn get(&self, filename: &str) -> Result<Vec<u8>> {
        let response = ok_or_remote(self.request(&Command::Get {
            filename: filename.to_string(),
        })?)?;
        response.file_bytes()
    }

    /// Store `data` as `filename`, returning the server's message
    pub fn upload(&self, filename: &str, data: &[u8]) -> Result<String> {
        let response = ok_or_remote(self.request(&Command::Upload {
            filename: filename.to_string(),
            data: data.to_vec(),
        })?)?;
        response.text().map(str::to_string).ok_or_else(|| unexpected("UPLOAD"))
    }

    /// Remove `filename`, returning the server's message
    pub fn delete(&self, filename: &str) -> Result<String> {
        let response = ok_or_remote(self.request(&Command::Delete {
            filename: filename.to_string(),
        })?)?;
        response.text().map(str::to_string).ok_or_else(|| unexpected("DELETE"))
    }

    fn connect(&self) -> Result<TcpStream> {
        let addr = self
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| VaultError::Network(format!("no address for {}", self.addr)))?;

        let stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        Ok(stream)
    }
}

fn ok_or_remote(response: Response) -> Result<Response> {
    if response.is_ok() {
        Ok(response)
    } else {
        let message = response.text().unwrap_or("unknown error").to_string();
        Err(VaultError::Remote(message))
    }
}

fn unexpected(verb: &str) -> VaultError {
    VaultError::Protocol(format!("unexpected response shape for {}", verb))
}
