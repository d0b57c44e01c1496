//! Response definitions
//!
//! Represents responses to clients. The JSON shape is discriminated by
//! which fields are present, so [`Body`] is untagged and flattened into
//! the object next to `status`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// Payload carried next to the status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    /// File contents (`data_namafile` + `data_file`)
    File {
        #[serde(rename = "data_namafile")]
        name: String,
        /// Base64 text of the file bytes
        #[serde(rename = "data_file")]
        content: String,
    },

    /// Directory listing (`data` as a list)
    List { data: Vec<String> },

    /// Human readable text (`data` as a string)
    Message { data: String },
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status code
    pub status: Status,

    #[serde(flatten)]
    pub body: Body,
}

impl Response {
    /// OK with a list of filenames
    pub fn list(names: Vec<String>) -> Self {
        Self {
            status: Status::Ok,
            body: Body::List { data: names },
        }
    }

    /// OK with a file, base64-encoding its bytes
    pub fn file(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            status: Status::Ok,
            body: Body::File {
                name: name.into(),
                content: STANDARD.encode(bytes),
            },
        }
    }

    /// OK with a text message
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            body: Body::Message { data: text.into() },
        }
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            body: Body::Message {
                data: message.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// The `data` string, for message and error responses
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Message { data } => Some(data),
            _ => None,
        }
    }

    /// The `data` list, for listing responses
    pub fn names(&self) -> Option<&[String]> {
        match &self.body {
            Body::List { data } => Some(data),
            _ => None,
        }
    }

    /// Decoded bytes of a file response
    pub fn file_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            Body::File { content, .. } => Ok(STANDARD.decode(content)?),
            _ => Err(VaultError::Protocol("response carries no file".to_string())),
        }
    }
}
