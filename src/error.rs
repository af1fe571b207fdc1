// Copyright 2025
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for record log operations.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The main error type for record log operations.
///
/// Readers and writers keep the first error they hit and return it from
/// every subsequent operation, so the type is `Clone`; I/O errors are held
/// behind an [`Arc`] to make that possible.
#[derive(Debug, Clone, Error)]
pub enum RecordLogError {
    /// An I/O error from the underlying stream.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The log ended cleanly: there are no more records.
    ///
    /// This is not corruption. It is stored like any other reader error and
    /// cleared by [`recover`](crate::reader::RecordReader::recover), so a
    /// caller tailing a growing log can resume once more data arrives.
    #[error("end of log")]
    Eof,

    /// The stream ended in the middle of a chunk.
    #[error("unexpected end of log")]
    UnexpectedEof,

    /// A chunk header was found where none can be.
    #[error("invalid chunk")]
    InvalidChunk,

    /// A chunk header at a record-start position was all zeroes, which marks
    /// a block that was preallocated but never written.
    #[error("invalid chunk (block appears to be zeroed)")]
    ZeroedBlock,

    /// A chunk header's payload length runs past the end of its block.
    #[error("invalid chunk (length overflows block)")]
    LengthOverflowsBlock,

    /// A chunk's stored checksum does not match its contents.
    #[error("invalid chunk (checksum mismatch)")]
    ChecksumMismatch,

    /// `seek_record` was called on a source without the seek capability.
    #[error("source does not support seeking")]
    NotSeekable,

    /// `last_record_offset` was called before any record was started.
    #[error("no last record exists")]
    NoLastRecord,

    /// A record handle was used after the reader advanced past its record.
    #[error("stale record handle")]
    StaleReader,

    /// The writer has been closed.
    #[error("writer is closed")]
    WriterClosed,
}

impl From<io::Error> for RecordLogError {
    fn from(err: io::Error) -> RecordLogError {
        RecordLogError::Io(Arc::new(err))
    }
}

/// A specialized Result type for record log operations.
pub type Result<T> = std::result::Result<T, RecordLogError>;
