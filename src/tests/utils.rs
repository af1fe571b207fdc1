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

//! Shared helpers for the codec test suites.

use std::io::Cursor;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::error::RecordLogError;
use crate::reader::RecordReader;
use crate::writer::RecordWriter;

/// Writes `records` through a writer backed by an in-memory sink and
/// returns the framed stream.
pub fn encode_records(records: &[&[u8]]) -> Vec<u8> {
    let mut writer = RecordWriter::new(Vec::new());
    for record in records {
        writer.write(record).unwrap();
        writer.finish().unwrap();
    }
    writer.close().unwrap();
    writer.get_ref().clone()
}

/// Reads every record from `data`, panicking on any error.
pub fn read_all(data: &[u8]) -> Vec<Vec<u8>> {
    let mut reader = RecordReader::new(Cursor::new(data.to_vec()));
    let mut records = Vec::new();
    loop {
        let rec = match reader.next() {
            Ok(rec) => rec,
            Err(RecordLogError::Eof) => return records,
            Err(e) => panic!("unexpected read error: {}", e),
        };
        let mut payload = Vec::new();
        reader.read_to_end(rec, &mut payload).unwrap();
        records.push(payload);
    }
}

/// Reads every reachable record from `data`, recovering at the next block
/// boundary on each error.
pub fn read_all_with_recovery(data: &[u8]) -> Vec<Vec<u8>> {
    let mut reader = RecordReader::new(Cursor::new(data.to_vec()));
    let mut records = Vec::new();
    loop {
        let rec = match reader.next() {
            Ok(rec) => rec,
            Err(RecordLogError::Eof) => return records,
            Err(_) => {
                reader.recover();
                continue;
            }
        };
        let mut payload = Vec::new();
        match reader.read_to_end(rec, &mut payload) {
            Ok(_) => records.push(payload),
            Err(_) => reader.recover(),
        }
    }
}

/// Deterministic pseudo-random records with a spread of sizes, including
/// empty ones.
pub fn random_records(seed: u64, count: usize, max_len: usize) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = (rng.next_u32() as usize) % max_len;
            let mut payload = vec![0u8; len];
            rng.fill_bytes(&mut payload);
            payload
        })
        .collect()
}
