//! An in-memory, read-mostly column store for interactive analytics.
//!
//! Rows go in once through [`StoreBuilder`]; what comes out is an immutable
//! [`ColumnStore`] holding one [`Field`] per column. Narrow columns are
//! indexed as value → row-id-set maps ([`IndexedField`]); wide columns fall
//! back to a dense per-row array ([`UnIndexedField`]). Equality filters and
//! partitions then run as set algebra over the [`facet_intset`] row-id sets,
//! producing [`FilteredView`]s that share the base store's columns and only
//! narrow the row-id set.
//!
//! ```
//! use facet_columnar::{BuildParams, FieldDescriptor, StoreBuilder, Value, ValueType};
//! use std::sync::Arc;
//!
//! let mut builder = StoreBuilder::new(
//!     vec![
//!         FieldDescriptor::new("color", ValueType::String),
//!         FieldDescriptor::new("size", ValueType::Number),
//!     ],
//!     BuildParams::default(),
//! )?;
//! builder.add_row(vec![Value::from("red"), Value::from(1.0)])?;
//! builder.add_row(vec![Value::from("blue"), Value::from(2.0)])?;
//! builder.add_row(vec![Value::from("red"), Value::from(3.0)])?;
//! let store = Arc::new(builder.finish()?);
//!
//! let red = store.filter_value("color", "red")?;
//! assert_eq!(red.size(), 2);
//! let by_color = store.partition("color")?;
//! assert_eq!(by_color.len(), 2);
//! # Ok::<(), facet_columnar::Error>(())
//! ```

#![forbid(unsafe_code)]

mod descriptor;
mod error;
mod field;
mod filter;
mod ingest;
mod store;
mod types;

pub use crate::descriptor::{
    DistinctEstimate, FieldDescriptor, FieldDescriptorBuilder, NumericRange,
};
pub use crate::error::{Error, Result};
pub use crate::field::{
    Field, IndexedField, IndexedFieldBuilder, UnIndexedField, UnIndexedFieldBuilder,
};
pub use crate::filter::{Filter, ValueFilter};
pub use crate::ingest::{
    build_from_source, BuildParams, RangeCalculator, RowSource, StorageClass, StoreBuilder,
    ValueFrequencyCalculator, DEFAULT_INDEXING_THRESHOLD,
};
pub use crate::store::{ColumnStore, FilteredView};
pub use crate::types::{Value, ValueType};
