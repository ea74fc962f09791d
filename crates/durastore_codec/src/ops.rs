//! Row operations against a [`Table`].

use crate::error::{CodecError, CodecResult};
use crate::reader::RowReader;
use crate::row::Row;
use crate::table::Table;
use crate::writer::RowWriter;

/// Encodes `value` into exactly `row_len` bytes.
///
/// # Errors
///
/// Returns `LengthMismatch` if the encoding is not exactly `row_len` bytes.
pub fn encode_row<R: Row>(value: &R, row_len: usize) -> CodecResult<Vec<u8>> {
    let mut writer = RowWriter::with_capacity(row_len);
    value.encode_fields(&mut writer);
    if writer.len() != row_len {
        return Err(CodecError::LengthMismatch {
            expected: row_len,
            actual: writer.len(),
        });
    }
    Ok(writer.into_bytes())
}

/// Decodes one row, requiring every byte to be consumed.
///
/// # Errors
///
/// Returns `UnexpectedEof` if `bytes` is too short, `TrailingBytes` if
/// bytes remain after the last field, or a field error.
pub fn decode_row<R: Row>(bytes: &[u8]) -> CodecResult<R> {
    let mut reader = RowReader::new(bytes);
    let value = R::decode_fields(&mut reader)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: reader.remaining().len(),
        });
    }
    Ok(value)
}

/// Encodes `value` and writes it at `row`.
///
/// The length check happens before the table is touched.
///
/// # Errors
///
/// Returns a length error or the table's write error.
pub fn write_row<T, R>(table: &mut T, row: u64, value: &R) -> Result<(), T::Error>
where
    T: Table + ?Sized,
    R: Row,
{
    let bytes = encode_row(value, table.row_len())?;
    table.write_row(row, &bytes)
}

/// Encodes `values` and writes them as consecutive rows from `start`.
///
/// Nothing is written unless every value encodes to exactly `row_len`
/// bytes.
///
/// # Errors
///
/// Returns a length error or the table's write error.
pub fn write_rows<T, R>(table: &mut T, start: u64, values: &[R]) -> Result<(), T::Error>
where
    T: Table + ?Sized,
    R: Row,
{
    let row_len = table.row_len();
    let mut buf = row_buffer(row_len, values.len(), false)?;
    for value in values {
        buf.extend_from_slice(&encode_row(value, row_len)?);
    }
    if values.is_empty() {
        return Ok(());
    }
    table.write_rows(start, &buf)
}

/// Reads and decodes the row at `row`.
///
/// # Errors
///
/// Returns the table's read error or a decoding error.
pub fn read_row<T, R>(table: &T, row: u64) -> Result<R, T::Error>
where
    T: Table + ?Sized,
    R: Row,
{
    let mut buf = vec![0u8; table.row_len()];
    table.read_row(row, &mut buf)?;
    Ok(decode_row(&buf)?)
}

/// Reads and decodes `count` consecutive rows from `start`.
///
/// # Errors
///
/// Returns the table's read error or a decoding error.
pub fn read_rows<T, R>(table: &T, start: u64, count: usize) -> Result<Vec<R>, T::Error>
where
    T: Table + ?Sized,
    R: Row,
{
    let row_len = table.row_len();
    if row_len == 0 {
        return Err(CodecError::invalid_table("row length is zero").into());
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut buf = row_buffer(row_len, count, true)?;
    table.read_rows(start, &mut buf)?;

    let mut values = Vec::with_capacity(count);
    for chunk in buf.chunks_exact(row_len) {
        values.push(decode_row(chunk)?);
    }
    Ok(values)
}

/// Allocates room for `count` rows, zero-filled when `zeroed` is set.
fn row_buffer(row_len: usize, count: usize, zeroed: bool) -> CodecResult<Vec<u8>> {
    let overflow = || CodecError::SizeOverflow { count, row_len };
    let len = row_len.checked_mul(count).ok_or_else(overflow)?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| overflow())?;
    if zeroed {
        buf.resize(len, 0);
    }
    Ok(buf)
}
