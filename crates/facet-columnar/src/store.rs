#![forbid(unsafe_code)]

use crate::error::{Error, Result};
use crate::field::Field;
use crate::filter::{Filter, ValueFilter};
use crate::types::Value;
use facet_intset::{IntSet, IntSetBuilder, RangeIntSet, RowId};
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable columnar store: a row count plus one [`Field`] per column.
///
/// The store's own row-id set is the full range `[0, size)`; queries narrow
/// it into [`FilteredView`]s without copying any column data. Stores are
/// kept behind [`Arc`] so views can share them.
#[derive(Debug)]
pub struct ColumnStore {
    size: u32,
    fields: Vec<Arc<Field>>,
    by_id: HashMap<String, usize>,
}

impl ColumnStore {
    /// Seal `fields` into a store over `size` rows. Field identifiers must
    /// be unique.
    pub fn new(size: u32, fields: Vec<Field>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            let id = field.identifier().to_owned();
            if by_id.insert(id, idx).is_some() {
                return Err(Error::DuplicateField {
                    identifier: field.identifier().to_owned(),
                });
            }
        }
        Ok(Self {
            size,
            fields: fields.into_iter().map(Arc::new).collect(),
            by_id,
        })
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// The store-wide row-id set: the full contiguous range.
    pub fn int_set(&self) -> IntSet {
        IntSet::Range(RangeIntSet::new(0, self.size))
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    pub fn field(&self, identifier: &str) -> Option<&Field> {
        self.by_id.get(identifier).map(|&idx| &*self.fields[idx])
    }

    fn field_or_err(&self, identifier: &str) -> Result<&Field> {
        self.field(identifier).ok_or_else(|| Error::UnknownField {
            identifier: identifier.to_owned(),
        })
    }

    /// Visit every row-id in ascending order.
    pub fn each_row(&self, mut action: impl FnMut(RowId)) {
        for row in 0..self.size {
            action(row);
        }
    }

    /// A raw store carries no filters.
    pub fn filters(&self) -> Vec<Filter> {
        Vec::new()
    }

    /// All values of every field for one row, in field order.
    pub fn row_values(&self, row: RowId) -> Vec<(&str, Vec<Value>)> {
        self.fields
            .iter()
            .map(|f| (f.identifier(), f.values_for_row(row)))
            .collect()
    }

    /// Narrow to the rows matching `filter`.
    pub fn filter(self: &Arc<Self>, filter: Filter) -> Result<FilteredView> {
        let bits = eval_filter(self, &filter, &self.int_set())?;
        Ok(FilteredView {
            base: Arc::clone(self),
            filters: vec![filter],
            bits,
        })
    }

    /// Narrow to the rows whose `field` contains `value`.
    pub fn filter_value(
        self: &Arc<Self>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<FilteredView> {
        self.filter(Filter::Value(ValueFilter::new(field, value)))
    }

    /// Like [`filter_value`](ColumnStore::filter_value) but keyed by a field
    /// reference instead of its identifier.
    pub fn filter_field(self: &Arc<Self>, field: &Field, value: impl Into<Value>) -> Result<FilteredView> {
        self.filter_value(field.identifier(), value)
    }

    /// Group the store by the distinct values of `field`: one view per value
    /// that has at least one matching row.
    pub fn partition(self: &Arc<Self>, field: &str) -> Result<HashMap<String, FilteredView>> {
        partition_rows(self, &[], &self.int_set(), field)
    }
}

/// A store narrowed by equality filters.
///
/// A view shares the base store's columns; only the row-id set shrinks. The
/// set is precomputed at construction, so `size` and row iteration are free
/// of any per-query scanning.
#[derive(Clone, Debug)]
pub struct FilteredView {
    base: Arc<ColumnStore>,
    filters: Vec<Filter>,
    bits: IntSet,
}

impl FilteredView {
    /// Number of matching rows.
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// The intersected row-id set.
    pub fn int_set(&self) -> &IntSet {
        &self.bits
    }

    /// The unfiltered store this view narrows.
    pub fn base(&self) -> &Arc<ColumnStore> {
        &self.base
    }

    pub fn fields(&self) -> &[Arc<Field>] {
        self.base.fields()
    }

    pub fn field(&self, identifier: &str) -> Option<&Field> {
        self.base.field(identifier)
    }

    /// Visit every matching row-id in ascending order.
    pub fn each_row(&self, mut action: impl FnMut(RowId)) {
        self.bits.each(&mut action);
    }

    /// The applied filters, in application order.
    pub fn filters(&self) -> Vec<Filter> {
        self.filters.clone()
    }

    /// The applied filters with exact duplicates removed. Advisory, for
    /// display.
    pub fn simplified_filters(&self) -> Vec<Filter> {
        let mut out: Vec<Filter> = Vec::new();
        for f in &self.filters {
            if !out.contains(f) {
                out.push(f.clone());
            }
        }
        out
    }

    /// Narrow further. Re-applying a filter already present returns the view
    /// unchanged.
    pub fn filter(&self, filter: Filter) -> Result<FilteredView> {
        if self.filters.contains(&filter) {
            return Ok(self.clone());
        }
        let bits = eval_filter(&self.base, &filter, &self.bits)?;
        let mut filters = self.filters.clone();
        filters.push(filter);
        Ok(FilteredView {
            base: Arc::clone(&self.base),
            filters,
            bits,
        })
    }

    pub fn filter_value(
        &self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<FilteredView> {
        self.filter(Filter::Value(ValueFilter::new(field, value)))
    }

    /// Drop `filter` and re-apply the rest against the base store.
    /// Intersection is not invertible, so the view is rebuilt rather than
    /// "subtracted". Removing an absent filter returns the view unchanged.
    pub fn remove_filter(&self, filter: &Filter) -> Result<FilteredView> {
        if !self.filters.contains(filter) {
            return Ok(self.clone());
        }
        let remaining: Vec<Filter> = self
            .filters
            .iter()
            .filter(|f| *f != filter)
            .cloned()
            .collect();
        let mut bits = self.base.int_set();
        for f in &remaining {
            bits = eval_filter(&self.base, f, &bits)?;
        }
        Ok(FilteredView {
            base: Arc::clone(&self.base),
            filters: remaining,
            bits,
        })
    }

    /// Group the view by the distinct values of `field`, pre-narrowed to the
    /// view's rows. Values with no matching row are omitted.
    pub fn partition(&self, field: &str) -> Result<HashMap<String, FilteredView>> {
        partition_rows(&self.base, &self.filters, &self.bits, field)
    }
}

/// The rows of `current` matching `filter`.
///
/// An indexed field answers from its value map — one set intersection, no
/// row scan. An unindexed field scans the current rows.
fn eval_filter(store: &ColumnStore, filter: &Filter, current: &IntSet) -> Result<IntSet> {
    let Filter::Value(vf) = filter;
    let field = store.field_or_err(&vf.field)?;
    Ok(match field {
        Field::Indexed(f) => f.int_set_for_value(&vf.value).intersection(current),
        Field::UnIndexed(f) => {
            let mut out = IntSetBuilder::new();
            for row in current.iter() {
                if f.row_has_value(row, &vf.value) {
                    out.push(row);
                }
            }
            out.finish()
        }
    })
}

fn partition_rows(
    base: &Arc<ColumnStore>,
    filters: &[Filter],
    current: &IntSet,
    field_id: &str,
) -> Result<HashMap<String, FilteredView>> {
    let field = base.field_or_err(field_id)?;
    let mut out = HashMap::new();

    let mut add_view = |value: &Value, bits: IntSet| {
        if bits.is_empty() {
            return;
        }
        let mut view_filters = filters.to_vec();
        view_filters.push(Filter::Value(ValueFilter::new(field_id, value.clone())));
        out.insert(
            value.key_string(),
            FilteredView {
                base: Arc::clone(base),
                filters: view_filters,
                bits,
            },
        );
    };

    match field {
        Field::Indexed(f) => {
            for (value, set) in f.entries() {
                add_view(value, set.intersection(current));
            }
        }
        Field::UnIndexed(f) => {
            // Dense columns carry no value map; bucket the current rows.
            let mut buckets: HashMap<String, (Value, IntSetBuilder)> = HashMap::new();
            for row in current.iter() {
                let value = f.value(row);
                if value.is_null() {
                    continue;
                }
                buckets
                    .entry(value.key_string())
                    .or_insert_with(|| (value.clone(), IntSetBuilder::new()))
                    .1
                    .push(row);
            }
            for (_, (value, builder)) in buckets {
                add_view(&value, builder.finish());
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use crate::field::{IndexedFieldBuilder, UnIndexedFieldBuilder};
    use crate::types::ValueType;

    /// rows: [("red", 1), ("blue", 2), ("red", 3)] with `size` unindexed.
    fn sample_store() -> Arc<ColumnStore> {
        let mut color = IndexedFieldBuilder::new(FieldDescriptor::new("color", ValueType::String));
        let mut size = UnIndexedFieldBuilder::new(FieldDescriptor::new("size", ValueType::Number));
        for (row, (c, s)) in [("red", 1.0), ("blue", 2.0), ("red", 3.0)].iter().enumerate() {
            color.insert(row as RowId, &Value::from(*c));
            size.insert(row as RowId, Value::from(*s));
        }
        Arc::new(
            ColumnStore::new(
                3,
                vec![Field::Indexed(color.finish()), Field::UnIndexed(size.finish())],
            )
            .unwrap(),
        )
    }

    #[test]
    fn store_int_set_is_the_full_range() {
        let store = sample_store();
        assert_eq!(store.size(), 3);
        assert_eq!(store.int_set().iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(store.filters().is_empty());
    }

    #[test]
    fn filter_on_indexed_field() {
        let store = sample_store();
        let red = store.filter_value("color", "red").unwrap();
        assert_eq!(red.size(), 2);
        assert_eq!(red.int_set().iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(red.filters().len(), 1);
    }

    #[test]
    fn filter_on_unindexed_field_scans_current_rows() {
        let store = sample_store();
        let two = store.filter_value("size", 2.0).unwrap();
        assert_eq!(two.int_set().iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn filters_compose_and_commute() {
        let store = sample_store();
        let a = store
            .filter_value("color", "red")
            .unwrap()
            .filter_value("size", 3.0)
            .unwrap();
        let b = store
            .filter_value("size", 3.0)
            .unwrap()
            .filter_value("color", "red")
            .unwrap();
        assert_eq!(a.int_set(), b.int_set());
        assert_eq!(a.int_set().iter().collect::<Vec<_>>(), vec![2]);
        // Application order still shows in the filter lists.
        assert_ne!(a.filters(), b.filters());
    }

    #[test]
    fn reapplying_a_filter_is_a_no_op() {
        let store = sample_store();
        let once = store.filter_value("color", "red").unwrap();
        let twice = once.filter_value("color", "red").unwrap();
        assert_eq!(once.int_set(), twice.int_set());
        assert_eq!(once.filters(), twice.filters());
    }

    #[test]
    fn remove_filter_rebuilds_from_base() {
        let store = sample_store();
        let view = store.filter_value("color", "red").unwrap();
        let back = view
            .remove_filter(&Filter::value("color", "red"))
            .unwrap();
        assert_eq!(back.int_set(), &store.int_set());
        assert!(back.filters().is_empty());

        // Removing an absent filter changes nothing.
        let same = view.remove_filter(&Filter::value("color", "green")).unwrap();
        assert_eq!(same.int_set(), view.int_set());
    }

    #[test]
    fn partition_splits_by_distinct_value() {
        let store = sample_store();
        let parts = store.partition("color").unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts["red"].int_set().iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(parts["blue"].int_set().iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn partition_on_unindexed_field() {
        let store = sample_store();
        let parts = store.partition("size").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts["3"].int_set().iter().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn partition_of_a_view_pre_intersects() {
        let store = sample_store();
        let red = store.filter_value("color", "red").unwrap();
        let parts = red.partition("size").unwrap();
        // Row 1 (size 2) is outside the view, so its value vanishes.
        assert_eq!(parts.len(), 2);
        assert!(parts.contains_key("1"));
        assert!(parts.contains_key("3"));
        assert!(!parts.contains_key("2"));
    }

    #[test]
    fn unknown_field_is_an_error() {
        let store = sample_store();
        let err = store.filter_value("nope", "x").unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn each_row_visits_ascending(){
        let store = sample_store();
        let mut rows = Vec::new();
        store.each_row(|r| rows.push(r));
        assert_eq!(rows, vec![0, 1, 2]);

        let red = store.filter_value("color", "red").unwrap();
        rows.clear();
        red.each_row(|r| rows.push(r));
        assert_eq!(rows, vec![0, 2]);
    }
}
