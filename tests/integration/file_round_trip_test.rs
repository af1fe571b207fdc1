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

//! Writing a log to a real file and reading it back, including offset
//! replay against the on-disk stream.

use std::fs::File;
use std::path::Path;

use tempfile::NamedTempFile;

use recordlog::error::Result;
use recordlog::reader::RecordReader;
use recordlog::writer::RecordWriter;

/// Writes `records` to a temp file, syncing before close, and returns the
/// file together with each record's reported start offset.
fn write_records_to_file<P>(records: &[P]) -> Result<(NamedTempFile, Vec<u64>)>
where
    P: AsRef<[u8]>,
{
    let file = NamedTempFile::new().expect("failed to create temp file");
    let mut writer = RecordWriter::new(file.reopen()?);

    let mut offsets = Vec::new();
    for record in records {
        writer.write(record.as_ref())?;
        writer.finish()?;
        offsets.push(writer.last_record_offset()?);
    }

    writer.sync()?;
    writer.close()?;
    Ok((file, offsets))
}

/// Reads every record from a file through the records iterator.
fn read_all_records<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let file = File::open(path)?;
    let mut reader = RecordReader::new(file);
    reader
        .records()
        .map(|r| r.map(|bytes| bytes.to_vec()))
        .collect()
}

#[test]
fn test_file_round_trip() -> Result<()> {
    super::init_logging();

    let test_records: Vec<Vec<u8>> = vec![
        b"record 1".to_vec(),
        b"record 2 with more data".to_vec(),
        Vec::new(),
        vec![0xabu8; 200_000],
        b"record 5".to_vec(),
    ];

    let (file, _) = write_records_to_file(&test_records)?;
    let read_records = read_all_records(file.path())?;

    assert_eq!(read_records.len(), test_records.len());
    for (i, (written, read)) in test_records.iter().zip(read_records.iter()).enumerate() {
        assert_eq!(written, read, "content mismatch for record {}", i);
    }

    Ok(())
}

#[test]
fn test_file_offsets_replay() -> Result<()> {
    super::init_logging();

    let test_records: Vec<Vec<u8>> = (0..50usize)
        .map(|i| format!("file record {} ", i).into_bytes().repeat(i % 7 + 1))
        .collect();

    let (file, offsets) = write_records_to_file(&test_records)?;

    let mut reader = RecordReader::new(File::open(file.path())?);
    for (i, &offset) in offsets.iter().enumerate().rev() {
        reader.seek_record(offset)?;
        let rec = reader.next()?;
        let mut payload = Vec::new();
        reader.read_to_end(rec, &mut payload)?;
        assert_eq!(payload, test_records[i], "offset replay for record {}", i);
    }

    Ok(())
}

#[test]
fn test_file_append_reopens_at_end() -> Result<()> {
    super::init_logging();

    let file = NamedTempFile::new().expect("failed to create temp file");

    // First writer session.
    let mut writer = RecordWriter::new(file.reopen()?);
    writer.write(b"before reopen")?;
    writer.close()?;

    // The stream stayed short of a block, so a second session appending at
    // the end continues the same block arithmetic.
    let mut handle = file.reopen()?;
    use std::io::Seek;
    handle.seek(std::io::SeekFrom::End(0))?;
    let mut writer = RecordWriter::new(handle);
    writer.write(b"after reopen")?;
    let offset = writer.last_record_offset()?;
    writer.close()?;

    let records = read_all_records(file.path())?;
    assert_eq!(records, vec![b"before reopen".to_vec(), b"after reopen".to_vec()]);

    let mut reader = RecordReader::new(File::open(file.path())?);
    reader.seek_record(offset)?;
    let rec = reader.next()?;
    let mut payload = Vec::new();
    reader.read_to_end(rec, &mut payload)?;
    assert_eq!(payload, b"after reopen");

    Ok(())
}
