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

//! Writer for block-framed record logs.
//!
//! [`RecordWriter`] accepts a sequence of records as streamed payload bytes,
//! fragments each record into chunks, packs the chunks into 32 KiB blocks,
//! and hands completed blocks to the underlying [`Sink`]. A record stays
//! buffered until it is sealed by [`next`](RecordWriter::next),
//! [`finish`](RecordWriter::finish), [`flush`](RecordWriter::flush),
//! [`sync`](RecordWriter::sync), or [`close`](RecordWriter::close).

use std::io;

use byteorder::{ByteOrder, LittleEndian};
use bytes::BytesMut;

use crate::chunk::ChunkType;
use crate::constants::{BLOCK_SIZE, CHUNK_HEADER_SIZE};
use crate::crc;
use crate::error::{RecordLogError, Result};
use crate::stream::Sink;

/// A writer for block-framed record logs.
///
/// The writer owns one 32 KiB block buffer. Payload bytes accumulate in the
/// buffer behind a reserved 7-byte chunk header; whenever the buffer fills
/// mid-record the chunk is sealed as `First`/`Middle`, the block is written
/// out, and the record continues in a fresh block.
///
/// Any error from the sink is kept and returned from every subsequent
/// operation; a failed writer cannot be revived.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use recordlog::writer::RecordWriter;
///
/// # fn example() -> recordlog::error::Result<()> {
/// let file = File::create("events.log")?;
/// let mut writer = RecordWriter::new(file);
///
/// writer.write(b"first record")?;
/// writer.finish()?;
/// writer.write(b"second record")?;
/// writer.sync()?;
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub struct RecordWriter<S: Sink> {
    /// The underlying sink.
    sink: S,

    /// `buf[i..j]` is the pending chunk; bytes `i..i + 7` are reserved for
    /// its header and `i + 7..j` hold the payload so far.
    i: usize,
    j: usize,

    /// `buf[..written]` has already been handed to the sink. Non-zero only
    /// after a flush in the middle of a block.
    written: usize,

    /// Absolute position of the sink at construction, when the sink could
    /// tell; 0 otherwise. Reported record offsets are anchored here.
    base_offset: u64,

    /// Zero-based number of the block currently held in `buf`.
    block_number: u64,

    /// Offset of the first chunk header of the most recently started record.
    last_record_offset: Option<u64>,

    /// Whether the pending chunk is the first chunk of its record.
    first: bool,

    /// Whether a chunk is buffered but not yet sealed.
    pending: bool,

    /// The first error the writer hit, if any. Sticky.
    err: Option<RecordLogError>,

    /// The block buffer.
    buf: BytesMut,
}

impl<S: Sink> RecordWriter<S> {
    /// Creates a writer appending to `sink` from its current position.
    pub fn new(mut sink: S) -> RecordWriter<S> {
        let base_offset = sink.position().unwrap_or(0);
        RecordWriter {
            sink,
            i: 0,
            j: 0,
            written: 0,
            base_offset,
            block_number: 0,
            last_record_offset: None,
            first: false,
            pending: false,
            err: None,
            buf: BytesMut::zeroed(BLOCK_SIZE),
        }
    }

    /// Fills in the header of the pending chunk. `last` seals the chunk as
    /// the end of its record.
    fn fill_header(&mut self, last: bool) {
        // The cursors are maintained solely by this writer, so a violation
        // here is a bug in the writer itself.
        assert!(
            self.i + CHUNK_HEADER_SIZE <= self.j && self.j <= BLOCK_SIZE,
            "bad writer state: i={} j={}",
            self.i,
            self.j
        );
        let kind = match (last, self.first) {
            (true, true) => ChunkType::Full,
            (true, false) => ChunkType::Last,
            (false, true) => ChunkType::First,
            (false, false) => ChunkType::Middle,
        };
        self.buf[self.i + 6] = kind.wire();
        let sum = crc::checksum(&self.buf[self.i + 6..self.j]);
        LittleEndian::write_u32(&mut self.buf[self.i..self.i + 4], sum);
        LittleEndian::write_u16(
            &mut self.buf[self.i + 4..self.i + 6],
            (self.j - self.i - CHUNK_HEADER_SIZE) as u16,
        );
    }

    /// Hands the rest of the buffered block to the sink and resets the
    /// cursors so the next chunk header lands at the new block's start.
    fn write_block(&mut self) {
        if let Err(e) = self.sink.write_all(&self.buf[self.written..BLOCK_SIZE]) {
            self.err = Some(e.into());
        }
        self.i = 0;
        self.j = CHUNK_HEADER_SIZE;
        self.written = 0;
        self.block_number += 1;
    }

    /// Seals the pending chunk and pushes everything buffered so far to the
    /// sink.
    fn write_pending(&mut self) {
        if self.err.is_some() {
            return;
        }
        if self.pending {
            self.fill_header(true);
            self.pending = false;
        }
        let result = self.sink.write_all(&self.buf[self.written..self.j]);
        self.written = self.j;
        if let Err(e) = result {
            self.err = Some(e.into());
        }
    }

    /// Reserves header space for a fresh record, spilling to a new block
    /// when fewer than 7 bytes of the current one remain, and records the
    /// record's start offset.
    fn start_record(&mut self) -> Result<()> {
        self.i = self.j;
        self.j += CHUNK_HEADER_SIZE;
        if self.j > BLOCK_SIZE {
            // No room for another header: zero the tail and move on.
            self.buf[self.i..BLOCK_SIZE].fill(0);
            self.write_block();
            if let Some(e) = &self.err {
                return Err(e.clone());
            }
        }
        self.last_record_offset =
            Some(self.base_offset + self.block_number * BLOCK_SIZE as u64 + self.i as u64);
        self.first = true;
        self.pending = true;
        Ok(())
    }

    /// Finishes any in-progress record, begins a new one, and returns a sink
    /// for the new record's payload.
    ///
    /// The returned [`RecordSink`] borrows the writer, so it is released
    /// before the writer can seal this record or start another.
    pub fn next(&mut self) -> Result<RecordSink<'_, S>> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if self.pending {
            self.fill_header(true);
            self.pending = false;
        }
        self.start_record()?;
        Ok(RecordSink { writer: self })
    }

    /// Appends `buf` to the current record, starting a new record if none is
    /// open.
    ///
    /// Driving this with an empty `buf` still opens a record, so a record
    /// with no payload is written as a valid zero-length `Full` chunk.
    pub fn write(&mut self, mut buf: &[u8]) -> Result<usize> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        if !self.pending {
            self.start_record()?;
        }
        let total = buf.len();
        while !buf.is_empty() {
            // Write the block out if it is full.
            if self.j == BLOCK_SIZE {
                self.fill_header(false);
                self.write_block();
                if let Some(e) = &self.err {
                    return Err(e.clone());
                }
                self.first = false;
            }
            let n = (BLOCK_SIZE - self.j).min(buf.len());
            self.buf[self.j..self.j + n].copy_from_slice(&buf[..n]);
            self.j += n;
            buf = &buf[n..];
        }
        Ok(total)
    }

    /// Marks the current record complete without starting a new one.
    pub fn finish(&mut self) -> Result<()> {
        if self.pending {
            self.fill_header(true);
            self.pending = false;
        }
        self.pending_err()
    }

    /// Finishes the current record, pushes buffered bytes to the sink, and
    /// invokes the sink's flush capability.
    pub fn flush(&mut self) -> Result<()> {
        self.write_pending();
        self.pending_err()?;
        if let Err(e) = self.sink.flush() {
            let e = RecordLogError::from(e);
            self.err = Some(e.clone());
            return Err(e);
        }
        Ok(())
    }

    /// Like [`flush`](RecordWriter::flush), then invokes the sink's
    /// durability capability.
    pub fn sync(&mut self) -> Result<()> {
        self.flush()?;
        if let Err(e) = self.sink.sync() {
            let e = RecordLogError::from(e);
            self.err = Some(e.clone());
            return Err(e);
        }
        Ok(())
    }

    /// Finishes the current record, pushes remaining buffered bytes, and
    /// permanently closes the writer. Every later operation reports
    /// [`WriterClosed`](RecordLogError::WriterClosed).
    pub fn close(&mut self) -> Result<()> {
        self.write_pending();
        self.pending_err()?;
        self.err = Some(RecordLogError::WriterClosed);
        Ok(())
    }

    /// The offset in the sink of the most recently started record, suitable
    /// to pass to [`seek_record`](crate::reader::RecordReader::seek_record).
    ///
    /// The offset is absolute when the sink reported its position at
    /// construction, and relative to construction otherwise. Reports
    /// [`NoLastRecord`](RecordLogError::NoLastRecord) when nothing was
    /// written yet.
    pub fn last_record_offset(&self) -> Result<u64> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }
        self.last_record_offset.ok_or(RecordLogError::NoLastRecord)
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// Writing to the sink directly desynchronizes the writer's block
    /// arithmetic; intended for inspection.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn pending_err(&self) -> Result<()> {
        match &self.err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl<S: Sink> Drop for RecordWriter<S> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Payload sink for the record most recently started with
/// [`RecordWriter::next`]. Writes append to that record's payload.
pub struct RecordSink<'a, S: Sink> {
    writer: &'a mut RecordWriter<S>,
}

impl<S: Sink> io::Write for RecordSink<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer
            .write(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Payload bytes land in the writer's block buffer as they are written;
    /// sealing and pushing the block is the parent writer's business.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
