//! Read-only access to log segment files made of Kafka record batches.
//!
//! https://kafka.apache.org/documentation/#recordbatch

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    constants::RECORD_BATCH_MAGIC,
    protocol::primitives::{DecodeError, KafkaBuf},
};

// base_offset (int64) + batch_length (int32)
const BATCH_PREFIX_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("corrupt record batch: {0}")]
    Decode(#[from] DecodeError),

    #[error("unsupported record batch magic {0}")]
    UnsupportedMagic(i8),
}

// single segment file of an externally written log
#[derive(Debug)]
pub struct LogSegment {
    file: File,
    path: PathBuf,
}

impl LogSegment {
    /// Opens the segment read-only and takes a shared advisory lock on it.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        file.lock_shared()?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_all(&mut self) -> io::Result<Bytes> {
        let mut data = Vec::new();
        self.file.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }
}

impl Drop for LogSegment {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBatch {
    pub base_offset: i64,
    pub partition_leader_epoch: i32,
    pub magic: i8,
    pub crc: u32,
    pub attributes: i16,
    pub last_offset_delta: i32,
    pub base_timestamp: i64,
    pub max_timestamp: i64,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub base_sequence: i32,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub attributes: i8,
    pub timestamp_delta: i64,
    pub offset_delta: i32,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub headers: Vec<RecordHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub key: String,
    pub value: Option<Bytes>,
}

fn read_varint_bytes(src: &mut Bytes, field: &'static str) -> Result<Option<Bytes>, DecodeError> {
    match src.read_varint()? {
        -1 => Ok(None),
        len if len < 0 => Err(DecodeError::InvalidLength {
            field,
            length: i64::from(len),
        }),
        len => src.read_bytes(len as usize).map(Some),
    }
}

impl Record {
    /// Decodes a record body; the varint length prefix has already been consumed.
    pub fn decode(src: &mut Bytes) -> Result<Self, DecodeError> {
        let attributes = src.read_i8()?;
        let timestamp_delta = src.read_varlong()?;
        let offset_delta = src.read_varint()?;
        let key = read_varint_bytes(src, "record key")?;
        let value = read_varint_bytes(src, "record value")?;

        let header_count = src.read_varint()?;
        let mut headers = Vec::new();
        for _ in 0..header_count.max(0) {
            let key = read_varint_bytes(src, "header key")?.unwrap_or_default();
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| DecodeError::InvalidUtf8("header key"))?;
            let value = read_varint_bytes(src, "header value")?;
            headers.push(RecordHeader { key, value });
        }

        Ok(Record {
            attributes,
            timestamp_delta,
            offset_delta,
            key,
            value,
            headers,
        })
    }
}

impl RecordBatch {
    /// Decodes a batch body, i.e. everything after `batch_length`.
    ///
    /// Records that fail to decode are skipped; their length prefix bounds
    /// them so the following records stay aligned.
    fn decode(base_offset: i64, src: &mut Bytes) -> Result<Self, LogError> {
        let partition_leader_epoch = src.read_i32()?;
        let magic = src.read_i8()?;
        if magic != RECORD_BATCH_MAGIC {
            return Err(LogError::UnsupportedMagic(magic));
        }
        let crc = src.read_u32()?;
        let attributes = src.read_i16()?;
        let last_offset_delta = src.read_i32()?;
        let base_timestamp = src.read_i64()?;
        let max_timestamp = src.read_i64()?;
        let producer_id = src.read_i64()?;
        let producer_epoch = src.read_i16()?;
        let base_sequence = src.read_i32()?;
        let records_count = src.read_i32()?;

        let mut records = Vec::new();
        for index in 0..records_count.max(0) {
            let mut body = match Self::next_record_body(src) {
                Ok(body) => body,
                Err(e) => {
                    warn!(base_offset, index, error = %e, "record batch ends mid-record");
                    break;
                }
            };
            match Record::decode(&mut body) {
                Ok(record) => records.push(record),
                Err(e) => debug!(base_offset, index, error = %e, "skipping undecodable record"),
            }
        }

        Ok(RecordBatch {
            base_offset,
            partition_leader_epoch,
            magic,
            crc,
            attributes,
            last_offset_delta,
            base_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records,
        })
    }

    fn next_record_body(src: &mut Bytes) -> Result<Bytes, DecodeError> {
        let len = src.read_varint()?;
        if len < 0 {
            return Err(DecodeError::InvalidLength {
                field: "record length",
                length: i64::from(len),
            });
        }
        src.read_bytes(len as usize)
    }
}

/// Splits a segment's contents into record batches.
///
/// A truncated trailing batch ends the scan. A batch that cannot be decoded
/// is skipped using its declared length.
pub fn read_batches(mut data: Bytes) -> Vec<RecordBatch> {
    let mut batches = Vec::new();

    while data.len() >= BATCH_PREFIX_SIZE {
        let (base_offset, batch_length) = match (data.read_i64(), data.read_i32()) {
            (Ok(offset), Ok(length)) => (offset, length),
            _ => break,
        };
        if batch_length < 0 || batch_length as usize > data.len() {
            warn!(
                base_offset,
                batch_length,
                available = data.len(),
                "truncated record batch at end of log"
            );
            break;
        }

        let mut body = data.split_to(batch_length as usize);
        match RecordBatch::decode(base_offset, &mut body) {
            Ok(batch) => batches.push(batch),
            Err(e) => warn!(base_offset, error = %e, "skipping record batch"),
        }
    }

    if !data.is_empty() {
        debug!(trailing = data.len(), "ignoring trailing bytes after last record batch");
    }

    batches
}
