//! CSV ingestion: a [`RowSource`] over delimited text.
//!
//! The first row names the columns (unless `has_header` is off, in which
//! case columns are named by position). Every cell ingests as a string
//! value; callers wanting typed columns supply their own descriptors and the
//! store builder coerces cells on the way in. Quoting follows the usual CSV
//! rules — a doubled quote inside a quoted field is a literal quote, and
//! quoted fields may span lines.

use crate::error::Result;
use facet_columnar::{
    build_from_source, BuildParams, ColumnStore, Error as ColumnarError, FieldDescriptor,
    RowSource, Value, ValueType,
};
use std::io::Read;

/// Tokenization knobs. The defaults are plain comma-separated text with
/// double-quote quoting and a header row.
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub delimiter: u8,
    pub quote: u8,
    pub has_header: bool,
    /// Treat zero-length cells as absent values.
    pub empty_is_null: bool,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: true,
            empty_is_null: true,
        }
    }
}

/// Streams CSV records as store rows.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    options: CsvReadOptions,
    descriptors: Option<Vec<FieldDescriptor>>,
}

impl<R: Read> CsvSource<R> {
    pub fn new(input: R, options: CsvReadOptions) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(options.has_header)
            .flexible(true)
            .from_reader(input);
        Self {
            reader,
            options,
            descriptors: None,
        }
    }

    /// Use caller-supplied descriptors instead of deriving string columns
    /// from the header. Cells are then coerced to the declared types during
    /// the build.
    pub fn with_descriptors(mut self, descriptors: Vec<FieldDescriptor>) -> Self {
        self.descriptors = Some(descriptors);
        self
    }

    fn cells(&self, record: &csv::StringRecord, width: usize, row: usize) -> Vec<Vec<Value>> {
        if record.len() != width {
            log::warn!(
                "CSV row {row}: {} cells where {width} columns are declared",
                record.len()
            );
        }
        (0..width)
            .map(|i| match record.get(i) {
                None => Vec::new(),
                Some("") if self.options.empty_is_null => Vec::new(),
                Some(cell) => vec![Value::from(cell)],
            })
            .collect()
    }
}

impl<R: Read> RowSource for CsvSource<R> {
    fn descriptors(&mut self) -> facet_columnar::Result<Vec<FieldDescriptor>> {
        if let Some(d) = &self.descriptors {
            return Ok(d.clone());
        }
        // `headers()` reads the first record whether or not it is consumed
        // as a header row; with `has_headers` off the record is replayed as
        // data below.
        let headers = self
            .reader
            .headers()
            .map_err(ColumnarError::source)?
            .clone();
        let derived: Vec<FieldDescriptor> = if self.options.has_header {
            headers
                .iter()
                .map(|name| FieldDescriptor::new(name, ValueType::String))
                .collect()
        } else {
            (0..headers.len())
                .map(|i| FieldDescriptor::new(format!("column{i}"), ValueType::String))
                .collect()
        };
        self.descriptors = Some(derived.clone());
        Ok(derived)
    }

    fn for_each_row(
        &mut self,
        sink: &mut dyn FnMut(Vec<Vec<Value>>) -> facet_columnar::Result<()>,
    ) -> facet_columnar::Result<()> {
        let width = self.descriptors()?.len();
        let mut row = 0usize;
        loop {
            let mut record = csv::StringRecord::new();
            let more = self
                .reader
                .read_record(&mut record)
                .map_err(ColumnarError::source)?;
            if !more {
                return Ok(());
            }
            sink(self.cells(&record, width, row))?;
            row += 1;
        }
    }
}

/// Read delimited text straight into a sealed [`ColumnStore`].
pub fn read_csv_store(input: impl Read, options: CsvReadOptions, params: BuildParams) -> Result<ColumnStore> {
    Ok(build_from_source(CsvSource::new(input, options), params)?)
}

/// Like [`read_csv_store`] but with caller-declared column types.
pub fn read_csv_store_with_descriptors(
    input: impl Read,
    options: CsvReadOptions,
    descriptors: Vec<FieldDescriptor>,
    params: BuildParams,
) -> Result<ColumnStore> {
    let source = CsvSource::new(input, options).with_descriptors(descriptors);
    Ok(build_from_source(source, params)?)
}
