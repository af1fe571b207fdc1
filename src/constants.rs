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

//! Wire-format constants. These are part of the on-disk format and must not
//! be changed.

/// The size of a log block. Blocks are the unit of corruption recovery and
/// the alignment unit for [`seek_record`](crate::reader::RecordReader::seek_record).
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Mask for splitting an absolute offset into its block base and the
/// residual within the block.
pub const BLOCK_SIZE_MASK: usize = BLOCK_SIZE - 1;

/// The size of a chunk header: a 4-byte checksum, a 2-byte little-endian
/// payload length, and a 1-byte chunk type.
pub const CHUNK_HEADER_SIZE: usize = 7;
