//! Little-endian row reader.

use crate::error::{CodecError, CodecResult};

/// Consumes the bytes of one row, field by field.
pub struct RowReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RowReader<'a> {
    /// Create a new reader for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read a single byte.
    #[inline]
    pub fn take_u8(&mut self) -> CodecResult<u8> {
        let [byte] = self.take_array::<1>()?;
        Ok(byte)
    }

    /// Read exactly `len` bytes.
    #[inline]
    pub fn take_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(CodecError::UnexpectedEof)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Read exactly `N` bytes into an array.
    #[inline]
    pub fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take_bytes(N)?);
        Ok(out)
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_advances_position() {
        let mut reader = RowReader::new(&[1, 2, 3, 4, 5]);
        assert_eq!(reader.take_u8().unwrap(), 1);
        assert_eq!(reader.take_array::<2>().unwrap(), [2, 3]);
        assert_eq!(reader.remaining(), &[4, 5]);
        assert_eq!(reader.take_bytes(2).unwrap(), &[4, 5]);
        assert!(reader.is_empty());
    }

    #[test]
    fn take_past_end_fails_without_consuming() {
        let mut reader = RowReader::new(&[1, 2]);
        assert_eq!(reader.take_array::<4>(), Err(CodecError::UnexpectedEof));
        assert_eq!(reader.remaining(), &[1, 2]);
    }
}
