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

//! Recordlog reads and writes sequences of records in the classic LevelDB
//! write-ahead-log framing, bit-for-bit compatible with existing logs.
//!
//! # Wire format
//!
//! The stream is divided into 32 KiB blocks, and each block contains a
//! number of tightly packed chunks. Chunks cannot cross block boundaries.
//! The last block may be shorter than 32 KiB. Any unused bytes in a block
//! must be zero.
//!
//! A record maps to one or more chunks. Each chunk has a 7-byte header (a
//! 4-byte masked CRC-32C, a 2-byte little-endian length, and a 1-byte chunk
//! type) followed by a payload. The checksum covers the chunk type and the
//! payload. A chunk is either the full record, or the first, middle, or
//! last chunk of a multi-chunk record.
//!
//! The framing allows limited recovery in the face of data corruption: on a
//! format error such as a checksum mismatch, the reader moves to the next
//! block and looks for the next full or first chunk.
//!
//! # Usage
//!
//! When writing, call [`RecordWriter::next`] to obtain an [`io::Write`] for
//! the next record (or [`RecordWriter::write`] to append without a handle);
//! calling `next` finishes the current record. Call
//! [`RecordWriter::close`] to finish the final record and seal the writer.
//!
//! When reading, call [`RecordReader::next`] to obtain a handle for the
//! next record and drain it with [`RecordReader::read`] or
//! [`RecordReader::read_to_end`]. It is valid to call `next` without
//! reading the current record to exhaustion. Neither readers nor writers
//! are safe for concurrent use.
//!
//! ```no_run
//! use std::fs::File;
//!
//! use recordlog::error::{RecordLogError, Result};
//! use recordlog::reader::RecordReader;
//! use recordlog::writer::RecordWriter;
//!
//! fn rewrite(from: &str, to: &str) -> Result<()> {
//!     let mut reader = RecordReader::new(File::open(from)?);
//!     let mut writer = RecordWriter::new(File::create(to)?);
//!     loop {
//!         let rec = match reader.next() {
//!             Ok(rec) => rec,
//!             Err(RecordLogError::Eof) => break,
//!             Err(e) => return Err(e),
//!         };
//!         let mut payload = Vec::new();
//!         reader.read_to_end(rec, &mut payload)?;
//!         writer.write(&payload)?;
//!         writer.finish()?;
//!     }
//!     writer.close()
//! }
//! ```
//!
//! [`io::Write`]: std::io::Write

pub mod chunk;
pub mod constants;
pub mod crc;
pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;


// Re-exports for a cleaner API
pub use error::{RecordLogError, Result};
pub use reader::{RecordHandle, RecordReader, Records};
pub use stream::{ReadSource, Sink, Source, WriteSink};
pub use writer::{RecordSink, RecordWriter};
