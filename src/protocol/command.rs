//! Command definitions
//!
//! Represents commands from clients.

/// Request verbs understood by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    List,
    Get,
    Upload,
    Delete,
}

impl Verb {
    /// Match a verb token, ignoring ASCII case
    pub fn parse(token: &str) -> Option<Self> {
        [Verb::List, Verb::Get, Verb::Upload, Verb::Delete]
            .into_iter()
            .find(|verb| token.eq_ignore_ascii_case(verb.as_str()))
    }

    /// Canonical (upper case) spelling on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::List => "LIST",
            Verb::Get => "GET",
            Verb::Upload => "UPLOAD",
            Verb::Delete => "DELETE",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List stored files
    List,

    /// Fetch a file
    Get { filename: String },

    /// Store a file (payload already base64-decoded)
    Upload { filename: String, data: Vec<u8> },

    /// Remove a file
    Delete { filename: String },
}

impl Command {
    /// Get the command verb
    pub fn verb(&self) -> Verb {
        match self {
            Command::List => Verb::List,
            Command::Get { .. } => Verb::Get,
            Command::Upload { .. } => Verb::Upload,
            Command::Delete { .. } => Verb::Delete,
        }
    }

    /// Target filename, if the command has one
    pub fn filename(&self) -> Option<&str> {
        match self {
            Command::List => None,
            Command::Get { filename }
            | Command::Upload { filename, .. }
            | Command::Delete { filename } => Some(filename),
        }
    }
}
