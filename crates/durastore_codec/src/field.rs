//! Fixed-width field encodings.

use crate::error::{CodecError, CodecResult};
use crate::reader::RowReader;
use crate::writer::RowWriter;

/// A value with a fixed little-endian encoding of `LEN` bytes.
pub trait Field: Sized {
    /// Encoded size in bytes.
    const LEN: usize;

    /// Append this field to a row.
    fn put(&self, writer: &mut RowWriter);

    /// Read this field from a row.
    fn take(reader: &mut RowReader<'_>) -> CodecResult<Self>;
}

macro_rules! le_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Field for $ty {
                const LEN: usize = std::mem::size_of::<$ty>();

                fn put(&self, writer: &mut RowWriter) {
                    writer.put_bytes(&self.to_le_bytes());
                }

                fn take(reader: &mut RowReader<'_>) -> CodecResult<Self> {
                    Ok(<$ty>::from_le_bytes(reader.take_array()?))
                }
            }
        )+
    };
}

le_field!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Field for bool {
    const LEN: usize = 1;

    fn put(&self, writer: &mut RowWriter) {
        writer.put_u8(u8::from(*self));
    }

    fn take(reader: &mut RowReader<'_>) -> CodecResult<Self> {
        match reader.take_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

impl<const N: usize> Field for [u8; N] {
    const LEN: usize = N;

    fn put(&self, writer: &mut RowWriter) {
        writer.put_bytes(self);
    }

    fn take(reader: &mut RowReader<'_>) -> CodecResult<Self> {
        reader.take_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<F: Field>(value: &F) -> Vec<u8> {
        let mut writer = RowWriter::new();
        value.put(&mut writer);
        writer.into_bytes()
    }

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(encode(&0x0102_u16), vec![0x02, 0x01]);
        assert_eq!(encode(&-2_i32), vec![0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(
            encode(&0x0102_0304_0506_0708_u64),
            vec![8, 7, 6, 5, 4, 3, 2, 1]
        );
    }

    #[test]
    fn encoded_size_matches_len() {
        assert_eq!(encode(&1u8).len(), u8::LEN);
        assert_eq!(encode(&1.5f32).len(), f32::LEN);
        assert_eq!(encode(&1.5f64).len(), f64::LEN);
        assert_eq!(encode(&true).len(), bool::LEN);
        assert_eq!(encode(&[7u8; 5]).len(), <[u8; 5]>::LEN);
    }

    #[test]
    fn bool_rejects_other_bytes() {
        let mut reader = RowReader::new(&[2]);
        assert_eq!(bool::take(&mut reader), Err(CodecError::InvalidBool(2)));
    }

    #[test]
    fn float_decodes_bit_exact() {
        let bytes = encode(&-0.0f64);
        let mut reader = RowReader::new(&bytes);
        let value = f64::take(&mut reader).unwrap();
        assert_eq!(value.to_bits(), (-0.0f64).to_bits());
    }
}
