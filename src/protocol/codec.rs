//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ### Request Tokenization
//! ```text
//! UPLOAD  photo.png  iVBORw0KGgo...
//! └verb┘  └─name──┘  └─payload (tokens 3..n, rejoined)─┘
//! ```

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{Command, FrameReader, Response, Verb};
use crate::error::{Result, VaultError};

/// End-of-frame marker for requests and responses
pub const DELIMITER: &[u8] = b"\r\n\r\n";

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as a request frame
pub fn encode_command(command: &Command) -> Vec<u8> {
    let line = match command {
        Command::List => Verb::List.as_str().to_string(),
        Command::Get { filename } | Command::Delete { filename } => {
            format!("{} {}", command.verb().as_str(), filename)
        }
        Command::Upload { filename, data } => {
            format!("{} {} {}", Verb::Upload.as_str(), filename, STANDARD.encode(data))
        }
    };

    let mut message = Vec::with_capacity(line.len() + DELIMITER.len());
    message.extend_from_slice(line.as_bytes());
    message.extend_from_slice(DELIMITER);
    message
}

/// Decode a request frame (delimiter already stripped) into a command
///
/// Shape errors (unknown verb, wrong token count, non UTF-8 input) all map
/// to [`VaultError::InvalidCommand`]. A well-formed UPLOAD with a broken
/// payload yields [`VaultError::Decode`].
pub fn decode_command(frame: &[u8]) -> Result<Command> {
    let line = std::str::from_utf8(frame).map_err(|_| VaultError::InvalidCommand)?;
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let (verb, args) = match tokens.split_first() {
        Some((first, rest)) => (Verb::parse(first).ok_or(VaultError::InvalidCommand)?, rest),
        None => return Err(VaultError::InvalidCommand),
    };

    match (verb, args) {
        (Verb::List, []) => Ok(Command::List),
        (Verb::Get, [filename]) => Ok(Command::Get {
            filename: filename.to_string(),
        }),
        (Verb::Delete, [filename]) => Ok(Command::Delete {
            filename: filename.to_string(),
        }),
        (Verb::Upload, [filename, payload @ ..]) if !payload.is_empty() => {
            // a wrapped payload arrives as several tokens; glue them back
            let encoded = payload.concat();
            Ok(Command::Upload {
                filename: filename.to_string(),
                data: STANDARD.decode(encoded)?,
            })
        }
        _ => Err(VaultError::InvalidCommand),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response as compact JSON followed by the delimiter
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut message = serde_json::to_vec(response)?;
    message.extend_from_slice(DELIMITER);
    Ok(message)
}

/// Decode a response frame (delimiter already stripped)
pub fn decode_response(frame: &[u8]) -> Result<Response> {
    Ok(serde_json::from_slice(frame)?)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one response frame from a stream
///
/// Fails with [`VaultError::Network`] if the peer closes before a full
/// frame arrives.
pub fn read_response<R: Read>(reader: &mut R, max_frame_size: usize) -> Result<Response> {
    let mut framer = FrameReader::new(max_frame_size);
    match framer.read_frame(reader)? {
        Some(frame) => decode_response(&frame),
        None => Err(VaultError::Network(
            "connection closed before a complete response".to_string(),
        )),
    }
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
