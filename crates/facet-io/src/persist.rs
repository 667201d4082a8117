//! Lossless JSON-shaped persistence for column stores.
//!
//! The wire model ([`StoreData`]) is language-neutral: field metadata plus,
//! per column, either the value→row-set index or the dense array. Reading is
//! all-or-nothing — malformed metadata rejects the whole store with a
//! descriptive error rather than constructing anything partial.

use crate::error::{Error, Result};
use facet_columnar::{
    ColumnStore, DistinctEstimate, Field, FieldDescriptor, IndexedField, NumericRange,
    UnIndexedField, Value, ValueType,
};
use facet_intset::{ArrayIntSet, IntSet, RangeIntSet};
use serde::{Deserialize, Serialize};

/// Stand-in for an unlimited distinct-value estimate; JSON has no infinity.
pub const UNLIMITED_ESTIMATE: u64 = u64::MAX;

/// Serialized form of a whole store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoreData {
    pub size: u32,
    pub fields: Vec<FieldMetaData>,
}

/// Serialized form of one column.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FieldMetaData {
    #[serde(rename = "indexed", rename_all = "camelCase")]
    Indexed {
        identifier: String,
        display_name: String,
        type_of_value: ValueType,
        distinct_value_estimate: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<NumericRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_constructor_name: Option<String>,
        values: Vec<ValueEntry>,
    },
    #[serde(rename = "unindexed", rename_all = "camelCase")]
    Unindexed {
        identifier: String,
        display_name: String,
        type_of_value: ValueType,
        distinct_value_estimate: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<NumericRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_constructor_name: Option<String>,
        offset: u32,
        data_array: Vec<Value>,
    },
}

/// One distinct value of an indexed column and the rows that hold it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValueEntry {
    pub value: Value,
    pub data: IntSetMetaData,
}

/// Serialized form of a row-id set.
///
/// `type` is a [`TypeCode`]: today's encodings are `"empty"`, `"range"`
/// (inclusive min/max) and `"array"` (ascending ids); the subtype/hint
/// grammar leaves room for packed encodings without a shape change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntSetMetaData {
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u32>>,
}

/// Parsed `"type/subtype;hint"` code: a main type, `/`-separated subtypes
/// and `;`-separated hints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeCode {
    main_type: String,
    sub_types: Vec<String>,
    hints: Vec<String>,
}

impl TypeCode {
    pub fn parse(code: &str) -> TypeCode {
        let mut parts = code.split(';');
        let path = parts.next().unwrap_or_default();
        let hints = parts.map(str::to_owned).collect();
        let mut segments = path.split('/');
        let main_type = segments.next().unwrap_or_default().to_owned();
        let sub_types = segments.map(str::to_owned).collect();
        TypeCode {
            main_type,
            sub_types,
            hints,
        }
    }

    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn sub_types(&self) -> &[String] {
        &self.sub_types
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Descend into the first subtype, keeping the hints. `None` when there
    /// is nothing left to descend into.
    pub fn next(&self) -> Option<TypeCode> {
        let (first, rest) = self.sub_types.split_first()?;
        Some(TypeCode {
            main_type: first.clone(),
            sub_types: rest.to_vec(),
            hints: self.hints.clone(),
        })
    }
}

/// Encode a row-id set. Packed sets travel as plain ascending arrays.
pub fn write_int_set(set: &IntSet) -> IntSetMetaData {
    if set.is_empty() {
        return IntSetMetaData {
            type_code: "empty".to_owned(),
            min: None,
            max: None,
            data: None,
        };
    }
    match set {
        IntSet::Range(_) => IntSetMetaData {
            type_code: "range".to_owned(),
            min: set.min(),
            max: set.max(),
            data: None,
        },
        _ => IntSetMetaData {
            type_code: "array".to_owned(),
            min: None,
            max: None,
            data: Some(set.iter().collect()),
        },
    }
}

/// Decode a row-id set, validating the invariants the store depends on.
pub fn read_int_set(meta: &IntSetMetaData) -> Result<IntSet> {
    let code = TypeCode::parse(&meta.type_code);
    match code.main_type() {
        "empty" => Ok(IntSet::empty()),
        "range" => {
            let (Some(min), Some(max)) = (meta.min, meta.max) else {
                return Err(Error::deserialize("range set without min/max"));
            };
            if min > max {
                return Err(Error::deserialize(format!(
                    "range set has min {min} > max {max}"
                )));
            }
            Ok(IntSet::Range(RangeIntSet::new(min, max - min + 1)))
        }
        "array" => {
            let Some(data) = &meta.data else {
                return Err(Error::deserialize("array set without data"));
            };
            if !data.windows(2).all(|w| w[0] < w[1]) {
                return Err(Error::deserialize("array set data is not strictly ascending"));
            }
            Ok(IntSet::Array(ArrayIntSet::from_sorted(data.clone())).into_best())
        }
        other => Err(Error::deserialize(format!(
            "unsupported set encoding `{other}`"
        ))),
    }
}

fn estimate_to_wire(estimate: DistinctEstimate) -> u64 {
    match estimate {
        DistinctEstimate::Exact(n) => n as u64,
        _ => UNLIMITED_ESTIMATE,
    }
}

fn estimate_from_wire(raw: u64) -> DistinctEstimate {
    if raw == UNLIMITED_ESTIMATE {
        DistinctEstimate::Unlimited
    } else {
        DistinctEstimate::Exact(raw as usize)
    }
}

/// Encode a sealed store into its wire model.
pub fn write_store(store: &ColumnStore) -> StoreData {
    let fields = store
        .fields()
        .iter()
        .map(|field| {
            let d = field.descriptor();
            match &**field {
                Field::Indexed(f) => FieldMetaData::Indexed {
                    identifier: d.identifier.clone(),
                    display_name: d.display_name.clone(),
                    type_of_value: d.value_type,
                    distinct_value_estimate: estimate_to_wire(d.distinct_estimate),
                    range: d.range,
                    type_constructor_name: d.type_constructor.clone(),
                    values: f
                        .entries()
                        .map(|(value, set)| ValueEntry {
                            value: value.clone(),
                            data: write_int_set(set),
                        })
                        .collect(),
                },
                Field::UnIndexed(f) => FieldMetaData::Unindexed {
                    identifier: d.identifier.clone(),
                    display_name: d.display_name.clone(),
                    type_of_value: d.value_type,
                    distinct_value_estimate: estimate_to_wire(d.distinct_estimate),
                    range: d.range,
                    type_constructor_name: d.type_constructor.clone(),
                    offset: f.first_row(),
                    data_array: f.data().to_vec(),
                },
            }
        })
        .collect();
    StoreData {
        size: store.size() as u32,
        fields,
    }
}

fn descriptor_from_wire(
    identifier: String,
    display_name: String,
    type_of_value: ValueType,
    distinct_value_estimate: u64,
    range: Option<NumericRange>,
    type_constructor_name: Option<String>,
) -> FieldDescriptor {
    let mut d = FieldDescriptor::new(identifier, type_of_value);
    d.display_name = display_name;
    d.distinct_estimate = estimate_from_wire(distinct_value_estimate);
    // A range only means something on a numeric column; elsewhere it is
    // tolerated and dropped.
    d.range = if type_of_value == ValueType::Number {
        range
    } else {
        None
    };
    d.type_constructor = type_constructor_name;
    d
}

/// Decode a wire model back into a sealed store.
pub fn read_store(data: StoreData) -> Result<ColumnStore> {
    let size = data.size;
    let mut fields = Vec::with_capacity(data.fields.len());
    for field in data.fields {
        match field {
            FieldMetaData::Indexed {
                identifier,
                display_name,
                type_of_value,
                distinct_value_estimate,
                range,
                type_constructor_name,
                values,
            } => {
                let descriptor = descriptor_from_wire(
                    identifier.clone(),
                    display_name,
                    type_of_value,
                    distinct_value_estimate,
                    range,
                    type_constructor_name,
                );
                let mut entries = Vec::with_capacity(values.len());
                for entry in values {
                    let set = read_int_set(&entry.data)?;
                    if let Some(max) = set.max() {
                        if u64::from(max) >= u64::from(size) {
                            return Err(Error::deserialize(format!(
                                "field `{identifier}` indexes row {max} but the store has {size} rows"
                            )));
                        }
                    }
                    entries.push((entry.value, set));
                }
                fields.push(Field::Indexed(IndexedField::from_entries(
                    descriptor, entries,
                )?));
            }
            FieldMetaData::Unindexed {
                identifier,
                display_name,
                type_of_value,
                distinct_value_estimate,
                range,
                type_constructor_name,
                offset,
                data_array,
            } => {
                let end = u64::from(offset) + data_array.len() as u64;
                if end > u64::from(size) {
                    return Err(Error::deserialize(format!(
                        "field `{identifier}` covers rows up to {end} but the store has {size} rows"
                    )));
                }
                let descriptor = descriptor_from_wire(
                    identifier,
                    display_name,
                    type_of_value,
                    distinct_value_estimate,
                    range,
                    type_constructor_name,
                );
                fields.push(Field::UnIndexed(UnIndexedField::from_parts(
                    descriptor, offset, data_array,
                )));
            }
        }
    }
    Ok(ColumnStore::new(size, fields)?)
}

/// Serialize a store to JSON text.
pub fn to_json_string(store: &ColumnStore) -> Result<String> {
    Ok(serde_json::to_string(&write_store(store))?)
}

/// Parse JSON text into a sealed store.
pub fn from_json_str(text: &str) -> Result<ColumnStore> {
    let data: StoreData = serde_json::from_str(text)?;
    read_store(data)
}
