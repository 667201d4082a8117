//! External formats for facet column stores: CSV in, JSON-shaped
//! persistence in and out.
//!
//! CSV tokenization is delegated to the `csv` crate and surfaced as a
//! [`RowSource`](facet_columnar::RowSource) feeding the normal store build.
//! Persistence is a lossless wire model ([`StoreData`]) round-tripping
//! through `serde_json`: `read_store(write_store(s))` behaves exactly like
//! `s`.

#![forbid(unsafe_code)]

mod csv;
mod error;
mod persist;

pub use crate::csv::{read_csv_store, read_csv_store_with_descriptors, CsvReadOptions, CsvSource};
pub use crate::error::{Error, Result};
pub use crate::persist::{
    from_json_str, read_int_set, read_store, to_json_string, write_int_set, write_store,
    FieldMetaData, IntSetMetaData, StoreData, TypeCode, ValueEntry, UNLIMITED_ESTIMATE,
};
