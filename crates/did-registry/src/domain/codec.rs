//! # Zero-Copy Binary Codec
//!
//! Typed byte-stream primitive used by every persistence and signing layer.
//!
//! - [`ZeroCopySink`] appends values to a growing buffer.
//! - [`ZeroCopySource`] reads the same values back from a borrowed buffer
//!   plus a cursor, failing with [`CodecError::DecodeTruncated`] instead of
//!   reading past the end.
//!
//! ## Wire Format
//!
//! | Type | Encoding |
//! |------|----------|
//! | `u8` | 1 byte |
//! | `bool` | `0x00` / `0x01` |
//! | `u16` / `u32` / `u64` | fixed width, big-endian |
//! | varint | `< 0xFD`: 1 byte; `0xFD` + u16; `0xFE` + u32; `0xFF` + u64 |
//! | bytes | varint length + raw bytes |
//! | string | UTF-8 bytes through the bytes encoding |
//! | `Vec<T>` | varint count + items |
//! | `Option<T>` | `0x00`, or `0x01` + item |
//!
//! Varints are big-endian and must use the narrowest form for their value.
//! The codec has no knowledge of document semantics.

use crate::errors::CodecError;

const VARINT_U16: u8 = 0xFD;
const VARINT_U32: u8 = 0xFE;
const VARINT_U64: u8 = 0xFF;

// =============================================================================
// SINK
// =============================================================================

/// Append-only encoding buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZeroCopySink {
    buf: Vec<u8>,
}

impl ZeroCopySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Write a variable-length unsigned integer in its narrowest form.
    pub fn write_var_uint(&mut self, value: u64) {
        if value < u64::from(VARINT_U16) {
            self.write_byte(value as u8);
        } else if let Ok(v) = u16::try_from(value) {
            self.write_byte(VARINT_U16);
            self.write_u16(v);
        } else if let Ok(v) = u32::try_from(value) {
            self.write_byte(VARINT_U32);
            self.write_u32(v);
        } else {
            self.write_byte(VARINT_U64);
            self.write_u64(value);
        }
    }

    /// Write a varint length prefix followed by the raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_var_uint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    /// Write raw bytes with no length prefix.
    pub fn write_fixed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// SOURCE
// =============================================================================

/// Cursor over a borrowed buffer.
///
/// Every read advances the cursor. A failed read leaves the cursor where
/// it was.
#[derive(Debug, Clone)]
pub struct ZeroCopySource<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> ZeroCopySource<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Current read offset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        let available = self.remaining();
        if needed > available {
            return Err(CodecError::DecodeTruncated { needed, available });
        }
        let start = self.cursor;
        self.cursor += needed;
        Ok(&self.buf[start..self.cursor])
    }

    pub fn read_byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                self.cursor -= 1;
                Err(CodecError::InvalidBool(other))
            }
        }
    }

    /// Read exactly `N` raw bytes.
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_be_bytes(self.read_fixed()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_be_bytes(self.read_fixed()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_be_bytes(self.read_fixed()?))
    }

    /// Read a varint, rejecting encodings wider than necessary.
    pub fn read_var_uint(&mut self) -> Result<u64, CodecError> {
        let start = self.cursor;
        let result = self.read_var_uint_inner();
        if result.is_err() {
            self.cursor = start;
        }
        result
    }

    fn read_var_uint_inner(&mut self) -> Result<u64, CodecError> {
        let (value, min) = match self.read_byte()? {
            VARINT_U16 => (u64::from(self.read_u16()?), u64::from(VARINT_U16)),
            VARINT_U32 => (u64::from(self.read_u32()?), u64::from(u16::MAX) + 1),
            VARINT_U64 => (self.read_u64()?, u64::from(u32::MAX) + 1),
            small => return Ok(u64::from(small)),
        };
        if value < min {
            return Err(CodecError::NonCanonicalVarint);
        }
        Ok(value)
    }

    /// Read a varint-prefixed byte string, borrowing from the buffer.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let start = self.cursor;
        let len = self.read_var_uint()?;
        let available = self.remaining();
        let needed = usize::try_from(len).unwrap_or(usize::MAX);
        if needed > available {
            self.cursor = start;
            return Err(CodecError::DecodeTruncated { needed, available });
        }
        self.take(needed)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let start = self.cursor;
        let bytes = self.read_bytes()?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_owned()),
            Err(_) => {
                self.cursor = start;
                Err(CodecError::InvalidUtf8)
            }
        }
    }

    /// Succeeds only if every byte has been consumed.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// A value with a canonical binary encoding.
pub trait Encodable {
    fn encode(&self, sink: &mut ZeroCopySink);

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut sink = ZeroCopySink::new();
        self.encode(&mut sink);
        sink.into_bytes()
    }
}

/// A value that can be read back from its canonical encoding.
pub trait Decodable: Sized {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError>;

    /// Decode a complete buffer, rejecting trailing bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut source = ZeroCopySource::new(bytes);
        let value = Self::decode(&mut source)?;
        source.finish()?;
        Ok(value)
    }
}

impl Encodable for bool {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_bool(*self);
    }
}

impl Decodable for bool {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        source.read_bool()
    }
}

impl Encodable for u32 {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_u32(*self);
    }
}

impl Decodable for u32 {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        source.read_u32()
    }
}

impl Encodable for u64 {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_u64(*self);
    }
}

impl Decodable for u64 {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        source.read_u64()
    }
}

impl Encodable for String {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_string(self);
    }
}

impl Decodable for String {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        source.read_string()
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, sink: &mut ZeroCopySink) {
        sink.write_var_uint(self.len() as u64);
        for item in self {
            item.encode(sink);
        }
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        let count = source.read_var_uint()?;
        // Every item takes at least one byte, so the remaining length bounds
        // any honest count.
        let remaining = source.remaining();
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count > remaining {
            return Err(CodecError::DecodeTruncated {
                needed: count,
                available: remaining,
            });
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::decode(source)?);
        }
        Ok(items)
    }
}

impl<T: Encodable> Encodable for Option<T> {
    fn encode(&self, sink: &mut ZeroCopySink) {
        match self {
            None => sink.write_byte(0),
            Some(value) => {
                sink.write_byte(1);
                value.encode(sink);
            }
        }
    }
}

impl<T: Decodable> Decodable for Option<T> {
    fn decode(source: &mut ZeroCopySource<'_>) -> Result<Self, CodecError> {
        match source.read_byte()? {
            0 => Ok(None),
            1 => Ok(Some(T::decode(source)?)),
            tag => Err(CodecError::InvalidTag {
                what: "option",
                tag,
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
