//! Frame reader for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for buffer management.
//! Implements a two-state machine:
//! - `Accumulating`: no delimiter seen yet, keep appending
//! - `Complete`: a frame was yielded, remaining bytes discarded
//!
//! The delimiter may arrive split across reads, so each search resumes a
//! few bytes before the end of the previous chunk.

use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use super::DELIMITER;
use crate::error::{Result, VaultError};

/// Size of each socket read
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Waiting for the delimiter
    Accumulating,
    /// A frame has been yielded
    Complete,
}

/// Accumulates stream bytes until one delimited frame is available
pub struct FrameReader {
    /// Bytes received so far
    buffer: BytesMut,
    /// Offset where the next delimiter search starts
    scanned: usize,
    /// Current state
    state: FrameState,
    /// Largest payload accepted before failing
    max_frame_size: usize,
}

impl FrameReader {
    /// Create a reader that fails once a payload exceeds `max_frame_size`
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            scanned: 0,
            state: FrameState::Accumulating,
            max_frame_size,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Bytes buffered and not yet yielded
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop buffered bytes and start accumulating again
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.state = FrameState::Accumulating;
    }

    /// Append `chunk` and return the frame payload once the delimiter shows up
    ///
    /// After a frame is yielded the reader stays `Complete` and ignores
    /// further input until [`reset`](Self::reset).
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Bytes>> {
        if self.state == FrameState::Complete {
            return Ok(None);
        }

        self.buffer.extend_from_slice(chunk);

        if let Some(pos) = find_delimiter(&self.buffer[self.scanned..]) {
            let end = self.scanned + pos;
            if end > self.max_frame_size {
                return Err(VaultError::FrameTooLarge {
                    limit: self.max_frame_size,
                });
            }
            let frame = self.buffer.split_to(end).freeze();
            // anything after the first frame is not processed
            self.buffer.clear();
            self.scanned = 0;
            self.state = FrameState::Complete;
            return Ok(Some(frame));
        }

        if self.buffer.len() > self.max_frame_size + DELIMITER.len() {
            return Err(VaultError::FrameTooLarge {
                limit: self.max_frame_size,
            });
        }

        self.scanned = self.buffer.len().saturating_sub(DELIMITER.len() - 1);
        Ok(None)
    }

    /// Read from `reader` until a frame is complete
    ///
    /// Returns `Ok(None)` if the peer closes the stream first.
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> Result<Option<Bytes>> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if let Some(frame) = self.push(&chunk[..n])? {
                return Ok(Some(frame));
            }
        }
    }
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(DELIMITER.len())
        .position(|window| window == DELIMITER)
}
