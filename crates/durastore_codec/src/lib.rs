//! # Durastore Codec
//!
//! Fixed-width binary rows for row-addressable tables.
//!
//! A row is the little-endian concatenation of its fields in declaration
//! order. Its length is known at compile time ([`Row::ROW_LEN`]) and must
//! match the table's `row_len` exactly:
//!
//! - encoding a value whose size differs from the slot is rejected before
//!   any I/O happens
//! - decoding fails if bytes are left over after the last field
//!
//! ## Usage
//!
//! ```
//! use durastore_codec::{impl_row, read_row, write_row, MemoryTable, Row};
//!
//! #[derive(Debug, PartialEq)]
//! struct Account {
//!     id: u32,
//!     balance: i64,
//! }
//!
//! impl_row!(Account { id: u32, balance: i64 });
//!
//! let mut table = MemoryTable::new(Account::ROW_LEN);
//! write_row(&mut table, 0, &Account { id: 7, balance: -20 }).unwrap();
//!
//! let back: Account = read_row(&table, 0).unwrap();
//! assert_eq!(back, Account { id: 7, balance: -20 });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod field;
mod ops;
mod reader;
mod row;
mod table;
mod writer;

pub use error::{CodecError, CodecResult};
pub use field::Field;
pub use ops::{decode_row, encode_row, read_row, read_rows, write_row, write_rows};
pub use reader::RowReader;
pub use row::Row;
pub use table::{MemoryTable, Table};
pub use writer::RowWriter;
