// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Byte-level writer/reader for frame headers and float32 regions.

use crate::config::FloatOrder;
use crate::error::{Result, TurfError};

/// Append-only frame buffer. This is the concatenation primitive the codec
/// writes every region through.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a new writer with a pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a little-endian u16.
    pub fn write_u16_le(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u32.
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a run of floats in the given byte order.
    pub fn write_f32s(&mut self, values: &[f32], order: FloatOrder) {
        self.buf.reserve(values.len() * 4);
        for &v in values {
            self.buf.extend_from_slice(&order.encode(v));
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a frame. Every read is bounds-checked and reports
/// [`TurfError::MalformedFrame`] on truncation.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over the provided byte slice.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    /// Read exactly `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or_else(|| TurfError::malformed("length overflow"))?;
        if end > self.bytes.len() {
            return Err(TurfError::malformed(format!(
                "buffer too short: need {end} bytes, have {}",
                self.bytes.len()
            )));
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self.take(N)?;
        chunk
            .try_into()
            .map_err(|_| TurfError::malformed("buffer too short"))
    }

    /// Read a little-endian u16.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array::<2>()?))
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array::<4>()?))
    }

    /// Read `count` floats in the given byte order.
    pub fn read_f32s(&mut self, count: usize, order: FloatOrder) -> Result<Vec<f32>> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| TurfError::malformed("float count overflow"))?;
        let bytes = self.take(len)?;
        Ok(decode_f32s(bytes, order))
    }
}

/// Decode a byte run whose length is a multiple of four into floats.
///
/// Any trailing partial word is ignored; callers check alignment first.
pub fn decode_f32s(bytes: &[u8], order: FloatOrder) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|w| order.decode([w[0], w[1], w[2], w[3]]))
        .collect()
}
