//! Bounds-checked big-endian cursor over a borrowed input slice.
//!
//! Every primitive used by the value decoder and type-descriptor parser
//! goes through here. Reads never panic on short input; they return
//! [`Error::Truncated`] instead, matching the defensive style of the
//! upstream `nom`-based primitive parsers this crate otherwise uses for
//! type-descriptor parsing.

use crate::error::{Error, Result};

/// A cursor over `&[u8]` that tracks a read position and only ever moves
/// forward.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        ByteReader { input, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    pub fn remaining_len(&self) -> usize {
        self.input.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_len() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining_len() < n {
            return Err(Error::truncated(n, self.remaining_len()));
        }
        let slice = &self.input[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.take(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Alias matching the native protocol's `[short]` type (unsigned 16-bit).
    pub fn read_short(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.take(8)?;
        Ok(i64::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_be_bytes(bytes.try_into().unwrap()))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take(8)?;
        Ok(f64::from_be_bytes(bytes.try_into().unwrap()))
    }

    /// `[bytes]`: an `[int]` length followed by that many bytes. A negative
    /// length means "absent"/NULL and yields `None` without consuming a
    /// payload.
    pub fn read_bytes(&mut self) -> Result<Option<&'a [u8]>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Ok(None);
        }
        Ok(Some(self.take(len as usize)?))
    }

    /// `[short bytes]`: a `[short]` (u16) length followed by that many bytes.
    pub fn read_short_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_short()?;
        self.take(len as usize)
    }

    /// `[string]`: a `[short]` length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_short_bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::malformed_text(format!("invalid UTF-8 in [string]: {e}")))
    }

    /// `[long string]`: an `[int]` length-prefixed UTF-8 string.
    pub fn read_long_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(Error::length_mismatch("[long string]", 0, len as usize));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::malformed_text(format!("invalid UTF-8 in [long string]: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let data = [0x00, 0x00, 0x01, 0x01];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_i32().unwrap(), 257);
        assert!(r.is_empty());
    }

    #[test]
    fn truncated_read_errors() {
        let data = [0x00, 0x01];
        let mut r = ByteReader::new(&data);
        assert!(matches!(r.read_i32(), Err(Error::Truncated { .. })));
    }

    #[test]
    fn negative_length_bytes_is_absent() {
        let data = (-1i32).to_be_bytes();
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_bytes().unwrap(), None);
    }

    #[test]
    fn reads_length_prefixed_string() {
        let mut data = vec![0x00, 0x03];
        data.extend_from_slice(b"abc");
        let mut r = ByteReader::new(&data);
        assert_eq!(r.read_string().unwrap(), "abc");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut data = vec![0x00, 0x01];
        data.push(0xff);
        let mut r = ByteReader::new(&data);
        assert!(matches!(r.read_string(), Err(Error::MalformedText(_))));
    }
}
