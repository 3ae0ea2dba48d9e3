//! Canonical binary encoding shared by every wire format in the crate.
//!
//! Integers that vary in size (versions, amounts, counts, offsets) are
//! written as little-endian base-128 varints: seven payload bits per byte,
//! high bit set on every byte except the last. Fixed-size fields (keys,
//! hashes, nonces) are written raw.
//!
//! As with the transaction signable bytes, we avoid general-purpose
//! serializers here: field order and width are consensus, not a detail of
//! whatever format a library happens to pick.

use thiserror::Error;

/// Errors produced while decoding a byte stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input: needed {needed} more byte(s) at offset {offset}")]
    UnexpectedEnd { offset: usize, needed: usize },

    #[error("varint at offset {offset} overflows {bits} bits")]
    VarintOverflow { offset: usize, bits: u32 },

    #[error("varint at offset {offset} is not minimally encoded")]
    NonCanonicalVarint { offset: usize },

    #[error("unknown {kind} tag 0x{tag:02x}")]
    UnknownTag { kind: &'static str, tag: u8 },

    #[error("{remaining} trailing byte(s) after decoding")]
    TrailingBytes { remaining: usize },

    #[error("length {length} exceeds the remaining {remaining} byte(s)")]
    LengthTooLarge { length: u64, remaining: usize },
}

/// Appends `value` as a varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Returns the varint encoding of `value` as a fresh buffer.
pub fn varint_bytes(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    write_varint(&mut buf, value);
    buf
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Append-only byte sink with the primitive field encoders.
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn varint(&mut self, value: u64) -> &mut Self {
        write_varint(&mut self.buf, value);
        self
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Varint length followed by the raw bytes.
    pub fn length_prefixed(&mut self, data: &[u8]) -> &mut Self {
        self.varint(data.len() as u64);
        self.bytes(data)
    }

    pub fn u32_le(&mut self, value: u32) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn u64_le(&mut self, value: u64) -> &mut Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Cursor over a borrowed byte slice.
///
/// Every read either consumes exactly the bytes it reports or fails without
/// moving the cursor, so a caller can inspect [`BinaryReader::position`] in
/// error paths.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Looks at the next byte without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn byte(&mut self) -> Result<u8, DecodeError> {
        let value = self.peek().ok_or(DecodeError::UnexpectedEnd {
            offset: self.pos,
            needed: 1,
        })?;
        self.pos += 1;
        Ok(value)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEnd {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64_le(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        let mut cursor = self.pos;
        loop {
            let byte = *self.data.get(cursor).ok_or(DecodeError::UnexpectedEnd {
                offset: cursor,
                needed: 1,
            })?;
            cursor += 1;

            let payload = u64::from(byte & 0x7f);
            if shift == 63 && payload > 1 || shift > 63 {
                return Err(DecodeError::VarintOverflow {
                    offset: start,
                    bits: 64,
                });
            }
            value |= payload << shift;

            if byte & 0x80 == 0 {
                if byte == 0 && shift > 0 {
                    return Err(DecodeError::NonCanonicalVarint { offset: start });
                }
                break;
            }
            shift += 7;
        }
        self.pos = cursor;
        Ok(value)
    }

    /// Varint narrowed to `u32`.
    pub fn varint_u32(&mut self) -> Result<u32, DecodeError> {
        let start = self.pos;
        let value = self.varint()?;
        u32::try_from(value).map_err(|_| {
            self.pos = start;
            DecodeError::VarintOverflow {
                offset: start,
                bits: 32,
            }
        })
    }

    /// Varint narrowed to `u8`.
    pub fn varint_u8(&mut self) -> Result<u8, DecodeError> {
        let start = self.pos;
        let value = self.varint()?;
        u8::try_from(value).map_err(|_| {
            self.pos = start;
            DecodeError::VarintOverflow {
                offset: start,
                bits: 8,
            }
        })
    }

    /// A varint length that must fit in what is left of the input.
    pub fn length(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let length = self.varint()?;
        if length > self.remaining() as u64 {
            self.pos = start;
            return Err(DecodeError::LengthTooLarge {
                length,
                remaining: self.remaining(),
            });
        }
        Ok(length as usize)
    }

    pub fn length_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.length()?;
        self.bytes(len)
    }

    /// Fails if any input is left unread.
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(DecodeError::TrailingBytes { remaining }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_known_encodings() {
        assert_eq!(varint_bytes(0), vec![0x00]);
        assert_eq!(varint_bytes(0x7f), vec![0x7f]);
        assert_eq!(varint_bytes(0x80), vec![0x80, 0x01]);
        assert_eq!(varint_bytes(300), vec![0xac, 0x02]);
        assert_eq!(varint_bytes(u64::MAX).len(), 10);
    }

    #[test]
    fn varint_decodes_extremes() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let bytes = varint_bytes(value);
            let mut reader = BinaryReader::new(&bytes);
            assert_eq!(reader.varint().unwrap(), value);
            assert!(reader.finish().is_ok());
        }
    }

    #[test]
    fn varint_rejects_overflow() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02];
        let mut reader = BinaryReader::new(&bytes);
        assert!(matches!(
            reader.varint(),
            Err(DecodeError::VarintOverflow { .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn varint_rejects_padding_zero() {
        let mut reader = BinaryReader::new(&[0x80, 0x00]);
        assert_eq!(
            reader.varint(),
            Err(DecodeError::NonCanonicalVarint { offset: 0 })
        );
    }

    #[test]
    fn varint_truncated() {
        let mut reader = BinaryReader::new(&[0x80]);
        assert!(matches!(
            reader.varint(),
            Err(DecodeError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn narrowing_restores_position() {
        let bytes = varint_bytes(300);
        let mut reader = BinaryReader::new(&bytes);
        assert!(reader.varint_u8().is_err());
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.varint_u32().unwrap(), 300);
    }

    #[test]
    fn length_prefix_bounds_checked() {
        let mut reader = BinaryReader::new(&[0x05, 0x01, 0x02]);
        assert!(matches!(
            reader.length_prefixed(),
            Err(DecodeError::LengthTooLarge { length: 5, .. })
        ));
    }

    #[test]
    fn writer_and_reader_agree() {
        let mut w = BinaryWriter::new();
        w.byte(0xab)
            .varint(1_000_000)
            .u32_le(7)
            .u64_le(u64::MAX)
            .length_prefixed(b"abc");
        let bytes = w.into_bytes();

        let mut r = BinaryReader::new(&bytes);
        assert_eq!(r.byte().unwrap(), 0xab);
        assert_eq!(r.varint().unwrap(), 1_000_000);
        assert_eq!(r.u32_le().unwrap(), 7);
        assert_eq!(r.u64_le().unwrap(), u64::MAX);
        assert_eq!(r.length_prefixed().unwrap(), b"abc");
        assert!(r.finish().is_ok());
    }

    #[test]
    fn finish_reports_trailing() {
        let r = BinaryReader::new(&[1, 2]);
        assert_eq!(r.finish(), Err(DecodeError::TrailingBytes { remaining: 2 }));
    }
}
