#![forbid(unsafe_code)]

use crate::descriptor::{DistinctEstimate, FieldDescriptor};
use crate::error::{Error, Result};
use crate::types::Value;
use facet_intset::{IntSet, IntSetBuilder, RowId};
use std::collections::HashMap;

static EMPTY_SET: IntSet = IntSet::empty();
static NULL_VALUE: Value = Value::Null;

/// A column stored as a map from distinct value to the set of rows holding
/// that value.
///
/// Distinct values keep their build order (first-seen, or the explicit order
/// handed to the builder). The per-value sets may legitimately be empty: an
/// enumeration can declare a level no row uses, and the level still shows up
/// in [`all_values`](IndexedField::all_values).
#[derive(Clone, Debug)]
pub struct IndexedField {
    descriptor: FieldDescriptor,
    values: Vec<Value>,
    lookup: HashMap<String, usize>,
    sets: Vec<IntSet>,
}

impl IndexedField {
    /// Assemble from already-built value/set pairs, e.g. when reading a
    /// persisted store. Pair order becomes the value order.
    pub fn from_entries(
        descriptor: FieldDescriptor,
        entries: Vec<(Value, IntSet)>,
    ) -> Result<Self> {
        let mut values = Vec::with_capacity(entries.len());
        let mut sets = Vec::with_capacity(entries.len());
        let mut lookup = HashMap::with_capacity(entries.len());
        for (value, set) in entries {
            let key = value.key_string();
            if lookup.insert(key.clone(), values.len()).is_some() {
                return Err(Error::DuplicateValue {
                    identifier: descriptor.identifier.clone(),
                    key,
                });
            }
            values.push(value);
            sets.push(set);
        }
        Ok(Self {
            descriptor,
            values,
            lookup,
            sets,
        })
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// The distinct values, in build order.
    pub fn all_values(&self) -> &[Value] {
        &self.values
    }

    /// The rows holding `value`; the canonical empty set for values this
    /// column has never seen.
    pub fn int_set_for_value(&self, value: &Value) -> &IntSet {
        self.lookup
            .get(&value.key_string())
            .map(|&slot| &self.sets[slot])
            .unwrap_or(&EMPTY_SET)
    }

    pub fn row_has_value(&self, row: RowId, value: &Value) -> bool {
        self.int_set_for_value(value).has(row)
    }

    /// Every value `row` carries, in value order. Costs a pass over the
    /// distinct values.
    pub fn values_for_row(&self, row: RowId) -> Vec<Value> {
        self.values
            .iter()
            .zip(&self.sets)
            .filter(|(_, set)| set.has(row))
            .map(|(v, _)| v.clone())
            .collect()
    }

    /// Exact: an indexed column enumerates its values.
    pub fn distinct_value_estimate(&self) -> usize {
        self.values.len()
    }

    /// Value/set pairs in value order, for persistence and partitioning.
    pub fn entries(&self) -> impl Iterator<Item = (&Value, &IntSet)> {
        self.values.iter().zip(self.sets.iter())
    }
}

/// Accumulates an [`IndexedField`] from rows arriving in ascending row order.
pub struct IndexedFieldBuilder {
    descriptor: FieldDescriptor,
    values: Vec<Value>,
    lookup: HashMap<String, usize>,
    builders: Vec<IntSetBuilder>,
    /// When the value list was supplied up front, unknown values are dropped
    /// rather than appended.
    closed: bool,
}

impl IndexedFieldBuilder {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            descriptor,
            values: Vec::new(),
            lookup: HashMap::new(),
            builders: Vec::new(),
            closed: false,
        }
    }

    /// Fix both the membership and the order of the distinct values. Rows
    /// mentioning values outside `values` are ignored; supplied values no
    /// row mentions keep an empty set.
    pub fn with_values(descriptor: FieldDescriptor, values: Vec<Value>) -> Self {
        let mut b = Self::new(descriptor);
        for value in values {
            let key = value.key_string();
            if b.lookup.insert(key, b.values.len()).is_none() {
                b.values.push(value);
                b.builders.push(IntSetBuilder::new());
            }
        }
        b.closed = true;
        b
    }

    /// Record that `row` carries `value`. Rows must arrive in ascending
    /// order; the same row may be inserted under several values.
    pub fn insert(&mut self, row: RowId, value: &Value) {
        let key = value.key_string();
        let slot = match self.lookup.get(&key) {
            Some(&slot) => slot,
            None if self.closed => return,
            None => {
                let slot = self.values.len();
                self.lookup.insert(key, slot);
                self.values.push(value.clone());
                self.builders.push(IntSetBuilder::new());
                slot
            }
        };
        let builder = &mut self.builders[slot];
        // A row restating the same value adds nothing.
        if builder.last() != Some(row) {
            builder.push(row);
        }
    }

    pub fn finish(self) -> IndexedField {
        let sets = self.builders.into_iter().map(IntSetBuilder::finish).collect();
        let mut descriptor = self.descriptor;
        // An index enumerates its values, so the estimate is exact.
        descriptor.distinct_estimate = DistinctEstimate::Exact(self.values.len());
        IndexedField {
            descriptor,
            values: self.values,
            lookup: self.lookup,
            sets,
        }
    }
}

/// A column stored as a dense per-row array, for wide-cardinality columns
/// where a value index would cost more than it saves. Always unary.
///
/// `data[i]` holds the value of row `offset + i`; [`Value::Null`] marks
/// absence. Leading null rows are trimmed by starting `data` at the first
/// row that was actually inserted.
#[derive(Clone, Debug)]
pub struct UnIndexedField {
    descriptor: FieldDescriptor,
    offset: u32,
    data: Vec<Value>,
}

impl UnIndexedField {
    /// Assemble from a persisted dense array.
    pub fn from_parts(descriptor: FieldDescriptor, offset: u32, data: Vec<Value>) -> Self {
        Self {
            descriptor,
            offset,
            data,
        }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    /// The row's value, or [`Value::Null`] when absent.
    pub fn value(&self, row: RowId) -> &Value {
        if row < self.offset {
            return &NULL_VALUE;
        }
        self.data.get((row - self.offset) as usize).unwrap_or(&NULL_VALUE)
    }

    /// Zero or one values, matching the indexed-field shape.
    pub fn values_for_row(&self, row: RowId) -> Vec<Value> {
        let v = self.value(row);
        if v.is_null() {
            Vec::new()
        } else {
            vec![v.clone()]
        }
    }

    pub fn row_has_value(&self, row: RowId, value: &Value) -> bool {
        !value.is_null() && self.value(row) == value
    }

    /// Row-id of `data[0]`. Serialization only.
    pub fn first_row(&self) -> RowId {
        self.offset
    }

    /// The dense backing array. Serialization only.
    pub fn data(&self) -> &[Value] {
        &self.data
    }
}

/// Builds an [`UnIndexedField`] from rows arriving in ascending order.
pub struct UnIndexedFieldBuilder {
    descriptor: FieldDescriptor,
    null_values: Vec<Value>,
    offset: Option<u32>,
    data: Vec<Value>,
}

impl UnIndexedFieldBuilder {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        Self {
            descriptor,
            null_values: Vec::new(),
            offset: None,
            data: Vec::new(),
        }
    }

    /// Values to coerce to null during ingestion (e.g. `"N/A"` markers).
    pub fn with_null_values(mut self, null_values: Vec<Value>) -> Self {
        self.null_values = null_values;
        self
    }

    /// Record `row`'s value. Rows must arrive in ascending order; skipped
    /// rows read back as null.
    pub fn insert(&mut self, row: RowId, value: Value) {
        let value = if self.null_values.contains(&value) {
            Value::Null
        } else {
            value
        };
        if value.is_null() && self.offset.is_none() {
            // Leading nulls never materialize; the offset starts at the
            // first real value.
            return;
        }
        let offset = *self.offset.get_or_insert(row);
        debug_assert!(row >= offset + self.data.len() as u32, "rows must ascend");
        while (self.data.len() as u32) < row - offset {
            self.data.push(Value::Null);
        }
        self.data.push(value);
    }

    pub fn finish(self) -> UnIndexedField {
        UnIndexedField {
            descriptor: self.descriptor,
            offset: self.offset.unwrap_or(0),
            data: self.data,
        }
    }
}

/// One column of a store: either value-indexed or densely stored.
#[derive(Clone, Debug)]
pub enum Field {
    Indexed(IndexedField),
    UnIndexed(UnIndexedField),
}

impl Field {
    pub fn descriptor(&self) -> &FieldDescriptor {
        match self {
            Field::Indexed(f) => f.descriptor(),
            Field::UnIndexed(f) => f.descriptor(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor().identifier
    }

    pub fn values_for_row(&self, row: RowId) -> Vec<Value> {
        match self {
            Field::Indexed(f) => f.values_for_row(row),
            Field::UnIndexed(f) => f.values_for_row(row),
        }
    }

    pub fn row_has_value(&self, row: RowId, value: &Value) -> bool {
        match self {
            Field::Indexed(f) => f.row_has_value(row, value),
            Field::UnIndexed(f) => f.row_has_value(row, value),
        }
    }

    pub fn as_indexed(&self) -> Option<&IndexedField> {
        match self {
            Field::Indexed(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_unindexed(&self) -> Option<&UnIndexedField> {
        match self {
            Field::UnIndexed(f) => Some(f),
            _ => None,
        }
    }
}
