//! Reader for block-framed record logs.
//!
//! # Overview
//!
//! [`RecordReader`] pulls 32 KiB blocks from an underlying [`Source`],
//! validates chunks, and reassembles them into records. Each call to
//! [`next`](RecordReader::next) yields a [`RecordHandle`] through which the
//! record's payload is streamed on demand; nothing forces a whole record
//! into memory at once.
//!
//! On a format error (a checksum mismatch, a zeroed or truncated chunk),
//! the error is kept as the reader's pending error.
//! [`recover`](RecordReader::recover) clears it and resumes the hunt for a
//! record start at the next 32 KiB block boundary; the record in progress at
//! the point of corruption is lost, as are any following records whose first
//! chunk sat in the damaged region.
//!
//! # Usage
//!
//! ```no_run
//! use std::fs::File;
//! use recordlog::error::{RecordLogError, Result};
//! use recordlog::reader::RecordReader;
//!
//! fn read_log(path: &str) -> Result<Vec<Vec<u8>>> {
//!     let mut reader = RecordReader::new(File::open(path)?);
//!     let mut records = Vec::new();
//!     loop {
//!         let rec = match reader.next() {
//!             Ok(rec) => rec,
//!             Err(RecordLogError::Eof) => break,
//!             Err(e) => return Err(e),
//!         };
//!         let mut payload = Vec::new();
//!         reader.read_to_end(rec, &mut payload)?;
//!         records.push(payload);
//!     }
//!     Ok(records)
//! }
//! ```

use std::io;

use bytes::{Bytes, BytesMut};
use log::{debug, warn};

use crate::chunk::{ChunkHeader, ChunkType};
use crate::constants::{BLOCK_SIZE, BLOCK_SIZE_MASK, CHUNK_HEADER_SIZE};
use crate::crc;
use crate::error::{RecordLogError, Result};
use crate::stream::Source;

/// Handle to the record most recently yielded by [`RecordReader::next`].
///
/// The handle holds no resources of its own: it carries the sequence number
/// it was minted with, and the reader rejects it with
/// [`StaleReader`](RecordLogError::StaleReader) once it has advanced past
/// the record (by `next`, `recover`, or `seek_record`).
#[derive(Debug, Clone, Copy)]
pub struct RecordHandle {
    seq: u64,
}

/// A reader for block-framed record logs.
///
/// The reader owns one 32 KiB block buffer. `buf[..n]` holds the most
/// recently fetched block's valid bytes and `buf[i..j]` is the unread
/// payload of the current chunk.
pub struct RecordReader<S: Source> {
    /// The underlying source.
    source: S,

    /// Sequence number of the current record, used to invalidate
    /// outstanding [`RecordHandle`]s.
    seq: u64,

    /// `buf[i..j]` is the unread portion of the current chunk's payload;
    /// `i` starts past the chunk header.
    i: usize,
    j: usize,

    /// Number of valid bytes in `buf`. Once reading has started, only the
    /// final block can have `n < BLOCK_SIZE`.
    n: usize,

    /// Whether `next` has found a record at all.
    started: bool,

    /// Whether the reader is resynchronizing after corruption.
    recovering: bool,

    /// Whether the current chunk is the last chunk of its record.
    last: bool,

    /// The pending error, if any. Cleared by `recover`.
    err: Option<RecordLogError>,

    /// The block buffer.
    buf: BytesMut,
}

impl<S: Source> RecordReader<S> {
    /// Creates a reader over `source`.
    pub fn new(source: S) -> RecordReader<S> {
        RecordReader {
            source,
            seq: 0,
            i: 0,
            j: 0,
            n: 0,
            started: false,
            recovering: false,
            last: false,
            err: None,
            buf: BytesMut::zeroed(BLOCK_SIZE),
        }
    }

    /// Sets `buf[i..j]` to the next chunk's payload, fetching the next block
    /// into the buffer as needed.
    ///
    /// With `want_first` the machine is hunting for the start of a record:
    /// continuation chunks are dropped silently, and a zeroed region is
    /// skipped via an internal recovery cycle instead of being reported.
    fn next_chunk(&mut self, want_first: bool) -> Result<()> {
        loop {
            if self.j + CHUNK_HEADER_SIZE <= self.n {
                let header = ChunkHeader::decode(&self.buf[self.j..]);

                if header.is_zeroed() {
                    if want_first || self.recovering {
                        // Skip the rest of the block if it looks like it is
                        // all zeroes. Common when the log was preallocated
                        // (e.g. via mmap) and never fully written.
                        //
                        // Setting the pending error first makes the recover
                        // call actually recover.
                        warn!("block appears to be zeroed, skipping the rest of it");
                        self.err = Some(RecordLogError::ZeroedBlock);
                        self.recover();
                        continue;
                    }
                    return Err(RecordLogError::InvalidChunk);
                }

                self.i = self.j + CHUNK_HEADER_SIZE;
                self.j = self.i + header.length as usize;
                if self.j > self.n {
                    if self.recovering {
                        self.recover();
                        continue;
                    }
                    return Err(RecordLogError::LengthOverflowsBlock);
                }
                if header.checksum != crc::checksum(&self.buf[self.i - 1..self.j]) {
                    if self.recovering {
                        self.recover();
                        continue;
                    }
                    warn!("chunk checksum mismatch");
                    return Err(RecordLogError::ChecksumMismatch);
                }
                let kind = ChunkType::from_wire(header.chunk_type);
                if want_first && !matches!(kind, Some(ChunkType::Full | ChunkType::First)) {
                    // Hunting for a record start: this is a continuation
                    // chunk of a record whose start we never saw.
                    continue;
                }
                self.last = matches!(kind, Some(ChunkType::Full | ChunkType::Last));
                self.recovering = false;
                return Ok(());
            }

            if self.n < BLOCK_SIZE && self.started {
                // The most recent read was short, so the stream ends here.
                if self.j != self.n {
                    return Err(RecordLogError::UnexpectedEof);
                }
                return Err(RecordLogError::Eof);
            }

            let n = read_full(&mut self.source, &mut self.buf[..BLOCK_SIZE])?;
            if n == 0 {
                return Err(RecordLogError::Eof);
            }
            self.i = 0;
            self.j = 0;
            self.n = n;
        }
    }

    /// Advances to the next record and returns a handle for streaming its
    /// payload through [`read`](RecordReader::read).
    ///
    /// A partially read current record is silently skipped, and any
    /// previously returned handle goes stale. Returns
    /// [`Eof`](RecordLogError::Eof) when there are no more records, and the
    /// pending error, if one is set, until [`recover`](RecordReader::recover)
    /// clears it.
    pub fn next(&mut self) -> Result<RecordHandle> {
        self.seq += 1;
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        // Discard the unread remainder of the current chunk.
        self.i = self.j;
        if let Err(e) = self.next_chunk(true) {
            self.err = Some(e.clone());
            return Err(e);
        }
        self.started = true;
        Ok(RecordHandle { seq: self.seq })
    }

    /// Reads payload bytes of `rec` into `buf`, pulling further chunks and
    /// blocks as needed. Returns `Ok(0)` once the record's last byte has
    /// been delivered, and [`StaleReader`](RecordLogError::StaleReader) if
    /// the reader has advanced past `rec`.
    pub fn read(&mut self, rec: RecordHandle, buf: &mut [u8]) -> Result<usize> {
        if rec.seq != self.seq {
            return Err(RecordLogError::StaleReader);
        }
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        while self.i == self.j {
            if self.last {
                return Ok(0);
            }
            if let Err(e) = self.next_chunk(false) {
                self.err = Some(e.clone());
                return Err(e);
            }
        }
        let n = buf.len().min(self.j - self.i);
        buf[..n].copy_from_slice(&self.buf[self.i..self.i + n]);
        self.i += n;
        Ok(n)
    }

    /// Drains the remaining payload of `rec` into `dst`, returning how many
    /// bytes were appended.
    pub fn read_to_end(&mut self, rec: RecordHandle, dst: &mut Vec<u8>) -> Result<usize> {
        if rec.seq != self.seq {
            return Err(RecordLogError::StaleReader);
        }
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        let mut total = 0;
        loop {
            dst.extend_from_slice(&self.buf[self.i..self.j]);
            total += self.j - self.i;
            self.i = self.j;
            if self.last {
                return Ok(total);
            }
            if let Err(e) = self.next_chunk(false) {
                self.err = Some(e.clone());
                return Err(e);
            }
        }
    }

    /// Clears the pending error so that the next call to
    /// [`next`](RecordReader::next) resumes at the next 32 KiB block
    /// boundary, searching for a `Full` or `First` chunk. Outstanding record
    /// handles go stale. No-op when no error is pending.
    pub fn recover(&mut self) {
        if self.err.is_none() {
            return;
        }
        debug!("recovering: discarding the rest of the current block");
        self.recovering = true;
        self.err = None;
        // Discard the rest of the current block.
        self.i = self.n;
        self.j = self.n;
        self.last = false;
        // Invalidate any outstanding record handle.
        self.seq += 1;
    }

    /// Repositions the reader so that the next call to
    /// [`next`](RecordReader::next) returns the record whose first chunk
    /// header begins exactly at `offset`, as previously reported by
    /// [`last_record_offset`](crate::writer::RecordWriter::last_record_offset).
    ///
    /// Behavior is undefined for an offset that is not a true record start:
    /// the bytes there may coincidentally form a valid header. Requires the
    /// seek capability ([`NotSeekable`](RecordLogError::NotSeekable)
    /// otherwise) and a clear error state (call
    /// [`recover`](RecordReader::recover) first after any error, including
    /// [`Eof`](RecordLogError::Eof)).
    pub fn seek_record(&mut self, offset: u64) -> Result<()> {
        self.seq += 1;
        if let Some(e) = &self.err {
            return Err(e.clone());
        }

        // Only seek to an exact block boundary; the residual is walked off
        // inside the buffer.
        let residual = (offset & BLOCK_SIZE_MASK as u64) as usize;
        match self.source.seek(offset & !(BLOCK_SIZE_MASK as u64)) {
            Ok(()) => {}
            Err(e @ RecordLogError::NotSeekable) => return Err(e),
            Err(e) => {
                self.err = Some(e.clone());
                return Err(e);
            }
        }

        // Clear the reader state and load the target block.
        self.i = 0;
        self.j = 0;
        self.n = 0;
        self.started = false;
        self.recovering = false;
        self.last = false;
        if let Err(e) = self.next_chunk(false) {
            self.err = Some(e.clone());
            return Err(e);
        }

        // Skip to the requested offset within the block.
        self.i = residual;
        self.j = residual;
        Ok(())
    }

    /// Returns an iterator over whole records.
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            reader: self,
            done: false,
        }
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Returns a mutable reference to the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the underlying source, consuming self.
    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Iterator over whole records, yielding each as owned [`Bytes`].
///
/// Yields `None` at the clean end of the log. A corruption or I/O error is
/// yielded once and ends the iteration; the parent reader keeps the error
/// pending, so after [`recover`](RecordReader::recover) a fresh iterator
/// picks up at the next block boundary.
pub struct Records<'a, S: Source> {
    reader: &'a mut RecordReader<S>,
    done: bool,
}

impl<S: Source> Iterator for Records<'_, S> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rec = match self.reader.next() {
            Ok(rec) => rec,
            Err(RecordLogError::Eof) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let mut payload = Vec::new();
        match self.reader.read_to_end(rec, &mut payload) {
            Ok(_) => Some(Ok(Bytes::from(payload))),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads until `buf` is full or the source reports a true end of stream.
fn read_full<S: Source>(source: &mut S, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
