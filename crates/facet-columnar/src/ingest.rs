//! One-pass reduction of row-oriented input into a sealed [`ColumnStore`].
//!
//! A [`StoreBuilder`] accumulates rows, tracks per-column statistics
//! (numeric range, distinct-value count), and at [`finish`](StoreBuilder::finish)
//! picks indexed or dense storage per column before sealing the store.

use crate::descriptor::{DistinctEstimate, FieldDescriptor, NumericRange};
use crate::error::{Error, Result};
use crate::field::{Field, IndexedFieldBuilder, UnIndexedFieldBuilder};
use crate::store::ColumnStore;
use crate::types::{Value, ValueType};
use facet_intset::RowId;
use std::collections::{HashMap, HashSet};

/// Storage shape override for one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    Indexed,
    UnIndexed,
}

/// Knobs for a store build.
#[derive(Debug, Default)]
pub struct BuildParams {
    /// Columns whose exact distinct count is at most this get a value index;
    /// wider columns fall back to dense storage. `None` uses
    /// [`DEFAULT_INDEXING_THRESHOLD`].
    pub indexing_threshold: Option<usize>,
    /// Per-column storage overrides, keyed by field identifier.
    pub storage_overrides: HashMap<String, StorageClass>,
    /// Cell values to coerce to null during ingestion (e.g. `"N/A"`).
    pub null_values: Vec<Value>,
    /// Per-column explicit distinct-value lists: fixes both membership and
    /// order of the column's index; observed values outside the list are
    /// dropped.
    pub explicit_values: HashMap<String, Vec<Value>>,
}

/// Columns with at most this many distinct values are indexed by default.
/// It is also the cap on distinct-value scanning: beyond it a column's
/// estimate degrades to unlimited.
pub const DEFAULT_INDEXING_THRESHOLD: usize = 1000;

/// Walks a column's numeric values and reduces them to `{min, max,
/// integer_only}`. Non-numeric and NaN cells are skipped, not errors.
#[derive(Debug, Default)]
pub struct RangeCalculator {
    min: f64,
    max: f64,
    integer_only: bool,
    seen: bool,
}

impl RangeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: &Value) {
        let Some(n) = value.as_f64() else { return };
        if n.is_nan() {
            return;
        }
        if self.seen {
            self.min = self.min.min(n);
            self.max = self.max.max(n);
            self.integer_only &= n.fract() == 0.0;
        } else {
            self.min = n;
            self.max = n;
            self.integer_only = n.fract() == 0.0;
            self.seen = true;
        }
    }

    /// `None` when no numeric value was observed.
    pub fn finish(&self) -> Option<NumericRange> {
        self.seen.then_some(NumericRange {
            min: self.min,
            max: self.max,
            integer_only: self.integer_only,
        })
    }
}

/// Tallies how often each distinct value occurs, in first-seen order.
#[derive(Debug, Default)]
pub struct ValueFrequencyCalculator {
    order: Vec<Value>,
    counts: HashMap<String, u64>,
}

impl ValueFrequencyCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Null cells are absences, not values; they are not tallied.
    pub fn observe(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        let key = value.key_string();
        match self.counts.get_mut(&key) {
            Some(n) => *n += 1,
            None => {
                self.counts.insert(key, 1);
                self.order.push(value.clone());
            }
        }
    }

    pub fn count(&self, value: &Value) -> u64 {
        self.counts.get(&value.key_string()).copied().unwrap_or(0)
    }

    pub fn distinct_count(&self) -> usize {
        self.order.len()
    }

    /// `(value, count)` pairs in first-seen order.
    pub fn frequencies(&self) -> impl Iterator<Item = (&Value, u64)> {
        self.order.iter().map(|v| (v, self.count(v)))
    }
}

/// Tracks distinct keys up to a cap, after which the column is declared
/// too wide to enumerate.
#[derive(Debug)]
struct DistinctScan {
    keys: HashSet<String>,
    cap: usize,
    overflowed: bool,
}

impl DistinctScan {
    fn new(cap: usize) -> Self {
        Self {
            keys: HashSet::new(),
            cap,
            overflowed: false,
        }
    }

    fn observe(&mut self, value: &Value) {
        if self.overflowed {
            return;
        }
        self.keys.insert(value.key_string());
        if self.keys.len() > self.cap {
            self.overflowed = true;
            self.keys.clear();
        }
    }

    fn estimate(&self) -> DistinctEstimate {
        if self.overflowed {
            DistinctEstimate::Unlimited
        } else {
            DistinctEstimate::Exact(self.keys.len())
        }
    }
}

struct FieldAccumulator {
    descriptor: FieldDescriptor,
    /// `(row, value)` pairs in arrival order; rows ascend, and a row repeats
    /// when it carries several values.
    cells: Vec<(RowId, Value)>,
    range: RangeCalculator,
    /// Absent when the descriptor pre-declared its estimate.
    distinct: Option<DistinctScan>,
    multi_valued: bool,
}

/// Accumulates rows and seals them into a [`ColumnStore`].
///
/// Rows are implicitly numbered by arrival order. Cell values are coerced to
/// the declared column type where a conversion exists; a cell that cannot be
/// converted is logged and treated as null — one bad cell never aborts an
/// ingestion.
pub struct StoreBuilder {
    accumulators: Vec<FieldAccumulator>,
    params: BuildParams,
    rows: u32,
}

impl StoreBuilder {
    pub fn new(descriptors: Vec<FieldDescriptor>, params: BuildParams) -> Result<Self> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.identifier.clone()) {
                return Err(Error::DuplicateField {
                    identifier: d.identifier.clone(),
                });
            }
        }
        let cap = params
            .indexing_threshold
            .unwrap_or(DEFAULT_INDEXING_THRESHOLD);
        let accumulators = descriptors
            .into_iter()
            .map(|descriptor| {
                let distinct = match descriptor.distinct_estimate {
                    DistinctEstimate::Unknown => Some(DistinctScan::new(cap)),
                    _ => None,
                };
                FieldAccumulator {
                    descriptor,
                    cells: Vec::new(),
                    range: RangeCalculator::new(),
                    distinct,
                    multi_valued: false,
                }
            })
            .collect();
        Ok(Self {
            accumulators,
            params,
            rows: 0,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows as usize
    }

    /// Append a unary row: exactly one cell per declared field, null marking
    /// absence.
    pub fn add_row(&mut self, cells: Vec<Value>) -> Result<()> {
        if cells.len() != self.accumulators.len() {
            return Err(Error::RowShapeMismatch {
                expected: self.accumulators.len(),
                actual: cells.len(),
            });
        }
        let row = self.rows;
        for (idx, value) in cells.into_iter().enumerate() {
            self.add_cell(idx, row, value);
        }
        self.rows += 1;
        Ok(())
    }

    /// Append a row where each field may carry any number of values.
    pub fn add_multi_row(&mut self, cells: Vec<Vec<Value>>) -> Result<()> {
        if cells.len() != self.accumulators.len() {
            return Err(Error::RowShapeMismatch {
                expected: self.accumulators.len(),
                actual: cells.len(),
            });
        }
        let row = self.rows;
        for (idx, values) in cells.into_iter().enumerate() {
            if values.len() > 1 {
                self.accumulators[idx].multi_valued = true;
            }
            for value in values {
                self.add_cell(idx, row, value);
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn add_cell(&mut self, idx: usize, row: RowId, value: Value) {
        let acc = &mut self.accumulators[idx];
        let value = if self.params.null_values.contains(&value) {
            Value::Null
        } else {
            coerce_value(&acc.descriptor, row, value)
        };
        if value.is_null() {
            return;
        }
        acc.range.observe(&value);
        if let Some(scan) = &mut acc.distinct {
            scan.observe(&value);
        }
        acc.cells.push((row, value));
    }

    /// Seal the accumulated rows, choosing per-column storage.
    pub fn finish(self) -> Result<ColumnStore> {
        let cap = self
            .params
            .indexing_threshold
            .unwrap_or(DEFAULT_INDEXING_THRESHOLD);
        let mut fields = Vec::with_capacity(self.accumulators.len());
        for acc in self.accumulators {
            let FieldAccumulator {
                mut descriptor,
                cells,
                range,
                distinct,
                multi_valued,
            } = acc;

            descriptor.distinct_estimate = match (&descriptor.distinct_estimate, &distinct) {
                (DistinctEstimate::Unknown, Some(scan)) => scan.estimate(),
                (DistinctEstimate::Unknown, None) => DistinctEstimate::Unlimited,
                (declared, _) => *declared,
            };
            if descriptor.value_type == ValueType::Number && descriptor.range.is_none() {
                descriptor.range = range.finish();
            }
            descriptor.multiple_values_per_row |= multi_valued;

            let explicit = self.params.explicit_values.get(&descriptor.identifier);
            let class = storage_class_for(&descriptor, &self.params, cap, explicit.is_some())?;
            let field = match class {
                StorageClass::Indexed => {
                    let mut b = match explicit {
                        Some(values) => {
                            IndexedFieldBuilder::with_values(descriptor, values.clone())
                        }
                        None => IndexedFieldBuilder::new(descriptor),
                    };
                    for (row, value) in &cells {
                        b.insert(*row, value);
                    }
                    Field::Indexed(b.finish())
                }
                StorageClass::UnIndexed => {
                    let mut b = UnIndexedFieldBuilder::new(descriptor);
                    for (row, value) in cells {
                        b.insert(row, value);
                    }
                    Field::UnIndexed(b.finish())
                }
            };
            fields.push(field);
        }
        ColumnStore::new(self.rows, fields)
    }
}

fn storage_class_for(
    descriptor: &FieldDescriptor,
    params: &BuildParams,
    cap: usize,
    has_explicit_values: bool,
) -> Result<StorageClass> {
    if let Some(&class) = params.storage_overrides.get(&descriptor.identifier) {
        if class == StorageClass::UnIndexed && descriptor.multiple_values_per_row {
            return Err(Error::MultiValuedUnindexed {
                identifier: descriptor.identifier.clone(),
            });
        }
        return Ok(class);
    }
    // An explicit value list only makes sense as an index, and a column with
    // several values per row cannot use the unary dense shape.
    if descriptor.multiple_values_per_row || has_explicit_values {
        return Ok(StorageClass::Indexed);
    }
    Ok(match descriptor.distinct_estimate {
        DistinctEstimate::Exact(n) if n <= cap => StorageClass::Indexed,
        _ => StorageClass::UnIndexed,
    })
}

/// Coerce a cell to its column's declared type.
///
/// Strings parse into numbers and booleans; an unparseable cell is logged
/// and nulled. Mismatches with no conversion rule are stored as given —
/// downstream statistics skip what they cannot read.
fn coerce_value(descriptor: &FieldDescriptor, row: RowId, value: Value) -> Value {
    match (descriptor.value_type, value) {
        (_, Value::Null) => Value::Null,
        (ValueType::Number, Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) => Value::Number(n),
            Err(_) => {
                log::warn!(
                    "field `{}` row {row}: cell `{s}` is not numeric, storing null",
                    descriptor.identifier
                );
                Value::Null
            }
        },
        (ValueType::Boolean, Value::String(s)) => match s.trim() {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            other => {
                log::warn!(
                    "field `{}` row {row}: cell `{other}` is not a boolean, storing null",
                    descriptor.identifier
                );
                Value::Null
            }
        },
        (_, value) => value,
    }
}

/// Boundary contract for row-oriented ingestion sources (the CSV reader
/// implements this).
pub trait RowSource {
    /// Field descriptors, in column order.
    fn descriptors(&mut self) -> Result<Vec<FieldDescriptor>>;

    /// Stream every row exactly once, in row-id order. Each row carries the
    /// values of every declared field, in descriptor order.
    fn for_each_row(&mut self, sink: &mut dyn FnMut(Vec<Vec<Value>>) -> Result<()>) -> Result<()>;
}

/// Orchestrate a full build: pull descriptors and rows from `source`, pick
/// storage per field, seal the store.
pub fn build_from_source<S: RowSource>(mut source: S, params: BuildParams) -> Result<ColumnStore> {
    let descriptors = source.descriptors()?;
    let mut builder = StoreBuilder::new(descriptors, params)?;
    source.for_each_row(&mut |cells| builder.add_multi_row(cells))?;
    builder.finish()
}
