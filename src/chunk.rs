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

//! Chunk types and the chunk header layout.
//!
//! A record maps to one or more chunks. Each chunk carries a 7-byte header:
//! a 4-byte masked CRC-32C, a 2-byte little-endian payload length, and a
//! 1-byte chunk type. The checksum covers the type byte and the payload.
//! Chunks never cross block boundaries.

use byteorder::{ByteOrder, LittleEndian};

/// On-wire chunk types.
///
/// A record is either a single [`Full`](ChunkType::Full) chunk, or a
/// [`First`](ChunkType::First) chunk followed by zero or more
/// [`Middle`](ChunkType::Middle) chunks and one [`Last`](ChunkType::Last)
/// chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    /// The chunk holds an entire record.
    Full = 1,
    /// The first chunk of a multi-chunk record.
    First = 2,
    /// An interior chunk of a multi-chunk record.
    Middle = 3,
    /// The final chunk of a multi-chunk record.
    Last = 4,
}

impl ChunkType {
    /// The byte stored in the chunk header.
    pub fn wire(self) -> u8 {
        self as u8
    }

    /// Decodes a chunk type byte, if it names a known type.
    pub fn from_wire(byte: u8) -> Option<ChunkType> {
        match byte {
            1 => Some(ChunkType::Full),
            2 => Some(ChunkType::First),
            3 => Some(ChunkType::Middle),
            4 => Some(ChunkType::Last),
            _ => None,
        }
    }
}

/// A decoded chunk header. Fields hold raw wire values; nothing is
/// validated at this layer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkHeader {
    pub checksum: u32,
    pub length: u16,
    pub chunk_type: u8,
}

impl ChunkHeader {
    /// Decodes the 7 header bytes at the start of `buf`.
    pub fn decode(buf: &[u8]) -> ChunkHeader {
        ChunkHeader {
            checksum: LittleEndian::read_u32(&buf[0..4]),
            length: LittleEndian::read_u16(&buf[4..6]),
            chunk_type: buf[6],
        }
    }

    /// Whether every header field is zero. Seen in the zero-filled tail of a
    /// block, or throughout a block that was preallocated and never written.
    pub fn is_zeroed(&self) -> bool {
        self.checksum == 0 && self.length == 0 && self.chunk_type == 0
    }
}
