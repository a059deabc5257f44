//! Wire primitives of the Kafka protocol.
//!
//! Decoding is exposed as [`KafkaBuf`], an extension of [`bytes::Buf`] whose
//! methods check the remaining length before consuming anything, so a short
//! or hostile payload yields a [`DecodeError`] instead of a panic. Encoding is
//! the mirror [`KafkaBufMut`] extension of [`bytes::BufMut`].
//!
//! https://kafka.apache.org/protocol.html#protocol_types

use bytes::{Buf, BufMut, Bytes};
use thiserror::Error;
use uuid::Uuid;

const MAX_VARINT_BYTES: usize = 5;
const MAX_VARLONG_BYTES: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("need {needed} bytes for {field}, only {remaining} remaining")]
    Truncated {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("varint longer than {0} bytes")]
    VarintTooLong(usize),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("invalid length {length} for {field}")]
    InvalidLength { field: &'static str, length: i64 },
}

fn ensure<B: Buf + ?Sized>(buf: &B, field: &'static str, needed: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        return Err(DecodeError::Truncated {
            field,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// A single tagged field: `(tag, size, bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedField {
    pub tag: u32,
    pub data: Bytes,
}

/// Tagged-fields block. Peers parse it positionally, so even an empty block
/// occupies one byte on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagBuffer {
    pub fields: Vec<TaggedField>,
}

impl TagBuffer {
    pub const EMPTY: TagBuffer = TagBuffer { fields: Vec::new() };

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub trait KafkaBuf: Buf {
    fn read_i8(&mut self) -> Result<i8, DecodeError> {
        ensure(self, "int8", 1)?;
        Ok(self.get_i8())
    }

    fn read_i16(&mut self) -> Result<i16, DecodeError> {
        ensure(self, "int16", 2)?;
        Ok(self.get_i16())
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        ensure(self, "int32", 4)?;
        Ok(self.get_i32())
    }

    fn read_i64(&mut self) -> Result<i64, DecodeError> {
        ensure(self, "int64", 8)?;
        Ok(self.get_i64())
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        ensure(self, "uint32", 4)?;
        Ok(self.get_u32())
    }

    fn read_bool(&mut self) -> Result<bool, DecodeError> {
        ensure(self, "boolean", 1)?;
        Ok(self.get_u8() != 0)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, DecodeError> {
        ensure(self, "bytes", len)?;
        Ok(self.copy_to_bytes(len))
    }

    fn read_unsigned_varint(&mut self) -> Result<u32, DecodeError> {
        let mut value = 0u32;
        for i in 0..MAX_VARINT_BYTES {
            ensure(self, "varint", 1)?;
            let byte = self.get_u8();
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintTooLong(MAX_VARINT_BYTES))
    }

    fn read_unsigned_varlong(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        for i in 0..MAX_VARLONG_BYTES {
            ensure(self, "varlong", 1)?;
            let byte = self.get_u8();
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::VarintTooLong(MAX_VARLONG_BYTES))
    }

    /// Zigzag-encoded signed varint, as used inside record batches.
    fn read_varint(&mut self) -> Result<i32, DecodeError> {
        let raw = self.read_unsigned_varint()?;
        Ok((raw >> 1) as i32 ^ -((raw & 1) as i32))
    }

    fn read_varlong(&mut self) -> Result<i64, DecodeError> {
        let raw = self.read_unsigned_varlong()?;
        Ok((raw >> 1) as i64 ^ -((raw & 1) as i64))
    }

    fn read_utf8(&mut self, len: usize, field: &'static str) -> Result<String, DecodeError> {
        ensure(self, field, len)?;
        let raw = self.copy_to_bytes(len);
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8(field))
    }

    /// int16 length followed by UTF-8 bytes.
    fn read_string(&mut self) -> Result<String, DecodeError> {
        match self.read_nullable_string()? {
            Some(s) => Ok(s),
            None => Err(DecodeError::InvalidLength {
                field: "string",
                length: -1,
            }),
        }
    }

    /// int16 length followed by UTF-8 bytes, -1 meaning null.
    fn read_nullable_string(&mut self) -> Result<Option<String>, DecodeError> {
        let len = self.read_i16()?;
        match len {
            -1 => Ok(None),
            n if n < 0 => Err(DecodeError::InvalidLength {
                field: "string",
                length: i64::from(n),
            }),
            n => self.read_utf8(n as usize, "string").map(Some),
        }
    }

    /// Unsigned varint of `length + 1` followed by UTF-8 bytes.
    fn read_compact_string(&mut self) -> Result<String, DecodeError> {
        match self.read_compact_nullable_string()? {
            Some(s) => Ok(s),
            None => Err(DecodeError::InvalidLength {
                field: "compact string",
                length: -1,
            }),
        }
    }

    fn read_compact_nullable_string(&mut self) -> Result<Option<String>, DecodeError> {
        match self.read_unsigned_varint()? {
            0 => Ok(None),
            n => self.read_utf8((n - 1) as usize, "compact string").map(Some),
        }
    }

    /// Element count of a compact array, `None` for a null array.
    fn read_compact_array_len(&mut self) -> Result<Option<usize>, DecodeError> {
        match self.read_unsigned_varint()? {
            0 => Ok(None),
            n => Ok(Some((n - 1) as usize)),
        }
    }

    fn read_uuid(&mut self) -> Result<Uuid, DecodeError> {
        ensure(self, "uuid", 16)?;
        let mut raw = [0u8; 16];
        self.copy_to_slice(&mut raw);
        Ok(Uuid::from_bytes(raw))
    }

    fn read_tag_buffer(&mut self) -> Result<TagBuffer, DecodeError> {
        let count = self.read_unsigned_varint()?;
        let mut fields = Vec::new();
        for _ in 0..count {
            let tag = self.read_unsigned_varint()?;
            let size = self.read_unsigned_varint()? as usize;
            let data = self.read_bytes(size)?;
            fields.push(TaggedField { tag, data });
        }
        Ok(TagBuffer { fields })
    }
}

impl<T: Buf + ?Sized> KafkaBuf for T {}

pub trait KafkaBufMut: BufMut {
    fn write_unsigned_varint(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.put_u8(value as u8);
    }

    fn write_unsigned_varlong(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.put_u8((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.put_u8(value as u8);
    }

    fn write_varint(&mut self, value: i32) {
        self.write_unsigned_varint(((value << 1) ^ (value >> 31)) as u32);
    }

    fn write_varlong(&mut self, value: i64) {
        self.write_unsigned_varlong(((value << 1) ^ (value >> 63)) as u64);
    }

    fn write_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }

    fn write_string(&mut self, value: &str) {
        self.put_i16(value.len() as i16);
        self.put_slice(value.as_bytes());
    }

    fn write_nullable_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => self.write_string(s),
            None => self.put_i16(-1),
        }
    }

    fn write_compact_string(&mut self, value: &str) {
        self.write_unsigned_varint(value.len() as u32 + 1);
        self.put_slice(value.as_bytes());
    }

    fn write_compact_nullable_string(&mut self, value: Option<&str>) {
        match value {
            Some(s) => self.write_compact_string(s),
            None => self.write_unsigned_varint(0),
        }
    }

    fn write_compact_array_len(&mut self, len: usize) {
        self.write_unsigned_varint(len as u32 + 1);
    }

    fn write_uuid(&mut self, value: &Uuid) {
        self.put_slice(value.as_bytes());
    }

    fn write_tag_buffer(&mut self, tags: &TagBuffer) {
        self.write_unsigned_varint(tags.fields.len() as u32);
        for field in &tags.fields {
            self.write_unsigned_varint(field.tag);
            self.write_unsigned_varint(field.data.len() as u32);
            self.put_slice(&field.data);
        }
    }
}

impl<T: BufMut + ?Sized> KafkaBufMut for T {}
