//! Little-endian primitive decoding over an in-memory buffer.
//!
//! All multi-byte values in a `.hic` container are little-endian; strings
//! are NUL-terminated byte sequences. Each [`Cursor`] is labelled with the
//! container section it is decoding so that truncation errors say what was
//! being read.

use crate::error::{HicError, Result};

/// Forward-only decoder over a borrowed byte buffer.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    context: &'static str,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8], context: &'static str) -> Self {
        Self {
            buf,
            pos: 0,
            context,
        }
    }

    /// Bytes left to decode.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(HicError::UnexpectedEof {
                context: self.context,
                expected: n,
                actual: self.remaining(),
            });
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Advance past `n` bytes without decoding them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let b = self.take(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a NUL-terminated string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<String> {
        let buf = self.buf;
        let rest = &buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(HicError::UnexpectedEof {
                context: self.context,
                expected: rest.len() + 1,
                actual: rest.len(),
            })?;
        self.pos += nul + 1;
        String::from_utf8(rest[..nul].to_vec())
            .map_err(|e| HicError::BadFormat(format!("invalid UTF-8 in {}: {}", self.context, e)))
    }
}
