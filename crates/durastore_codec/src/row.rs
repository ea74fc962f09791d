//! Row layouts.

use crate::error::CodecResult;
use crate::reader::RowReader;
use crate::writer::RowWriter;

/// A record with a fixed binary layout.
///
/// The layout is the little-endian concatenation of the fields in
/// declaration order, `ROW_LEN` bytes in total. Any padding must be a
/// declared field (for example a `[u8; N]`); the codec never adds any.
///
/// Most row types are declared with [`impl_row!`](crate::impl_row), which
/// computes `ROW_LEN` from the field types at compile time.
pub trait Row: Sized {
    /// Encoded size of one row in bytes.
    const ROW_LEN: usize;

    /// Append every field to `writer`.
    fn encode_fields(&self, writer: &mut RowWriter);

    /// Read every field from `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is too short or a field is invalid.
    fn decode_fields(reader: &mut RowReader<'_>) -> CodecResult<Self>;
}

/// Implements [`Row`] for a struct from its field list.
///
/// ```rust
/// use durastore_codec::{impl_row, Row};
///
/// #[derive(Debug, PartialEq)]
/// struct Sample {
///     id: u32,
///     value: f64,
///     tag: [u8; 4],
/// }
///
/// impl_row!(Sample { id: u32, value: f64, tag: [u8; 4] });
///
/// assert_eq!(Sample::ROW_LEN, 16);
/// ```
#[macro_export]
macro_rules! impl_row {
    ($ty:ident { $($field:ident : $fty:ty),+ $(,)? }) => {
        impl $crate::Row for $ty {
            const ROW_LEN: usize = 0 $(+ <$fty as $crate::Field>::LEN)+;

            fn encode_fields(&self, writer: &mut $crate::RowWriter) {
                $( <$fty as $crate::Field>::put(&self.$field, writer); )+
            }

            fn decode_fields(
                reader: &mut $crate::RowReader<'_>,
            ) -> $crate::CodecResult<Self> {
                Ok(Self {
                    $( $field: <$fty as $crate::Field>::take(reader)?, )+
                })
            }
        }
    };
}
