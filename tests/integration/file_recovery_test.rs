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

//! Reading a damaged on-disk log with recovery.

use std::fs;
use std::fs::File;

use tempfile::NamedTempFile;

use recordlog::constants::BLOCK_SIZE;
use recordlog::error::{RecordLogError, Result};
use recordlog::reader::RecordReader;
use recordlog::writer::RecordWriter;

#[test]
fn test_recover_from_damaged_file() -> Result<()> {
    super::init_logging();

    let file = NamedTempFile::new().expect("failed to create temp file");
    let mut writer = RecordWriter::new(file.reopen()?);

    // Enough records to fill several blocks.
    let records: Vec<Vec<u8>> = (0..200)
        .map(|i| format!("damaged file record {} ", i).into_bytes().repeat(40))
        .collect();
    for record in &records {
        writer.write(record)?;
        writer.finish()?;
    }
    writer.close()?;

    // Wipe out the second block on disk.
    let mut data = fs::read(file.path())?;
    assert!(data.len() > 3 * BLOCK_SIZE);
    for byte in &mut data[BLOCK_SIZE..2 * BLOCK_SIZE] {
        *byte = 0xff;
    }
    fs::write(file.path(), &data)?;

    let mut reader = RecordReader::new(File::open(file.path())?);
    let mut survivors = Vec::new();
    loop {
        let rec = match reader.next() {
            Ok(rec) => rec,
            Err(RecordLogError::Eof) => break,
            Err(_) => {
                reader.recover();
                continue;
            }
        };
        let mut payload = Vec::new();
        match reader.read_to_end(rec, &mut payload) {
            Ok(_) => survivors.push(payload),
            Err(_) => reader.recover(),
        }
    }

    // Everything before the damaged block and everything starting after it
    // comes back; the middle is gone.
    assert!(survivors.len() < records.len());
    assert!(
        survivors.len() > records.len() / 2,
        "recovery lost far more than one block of records"
    );
    for survivor in &survivors {
        assert!(records.contains(survivor), "recovered a record never written");
    }
    assert_eq!(survivors.first(), records.first());
    assert_eq!(survivors.last(), records.last());

    Ok(())
}
