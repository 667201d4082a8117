use crate::types::ValueType;
use serde::{Deserialize, Serialize};

/// Observed numeric bounds of a number-typed column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    /// True when every observed value was a whole number.
    pub integer_only: bool,
}

/// How many distinct values a column holds.
///
/// `Unknown` only exists pre-ingestion; a sealed store always carries either
/// an exact count or `Unlimited` (the column was declared or measured too
/// wide to enumerate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistinctEstimate {
    Unknown,
    Exact(usize),
    Unlimited,
}

impl DistinctEstimate {
    pub fn is_exact(&self) -> bool {
        matches!(self, DistinctEstimate::Exact(_))
    }
}

/// Metadata describing one column, independent of its storage shape.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    /// Unique within a store.
    pub identifier: String,
    pub display_name: String,
    pub value_type: ValueType,
    /// Present only for number-typed columns.
    pub range: Option<NumericRange>,
    pub distinct_estimate: DistinctEstimate,
    /// Whether a single row may carry several values for this column.
    pub multiple_values_per_row: bool,
    /// Constructor name for object-typed columns. Preserved through
    /// serialization but never dispatched on.
    pub type_constructor: Option<String>,
}

impl FieldDescriptor {
    /// A descriptor with the display name defaulting to the identifier and
    /// everything else unset.
    pub fn new(identifier: impl Into<String>, value_type: ValueType) -> Self {
        let identifier = identifier.into();
        Self {
            display_name: identifier.clone(),
            identifier,
            value_type,
            range: None,
            distinct_estimate: DistinctEstimate::Unknown,
            multiple_values_per_row: false,
            type_constructor: None,
        }
    }

    pub fn builder(identifier: impl Into<String>, value_type: ValueType) -> FieldDescriptorBuilder {
        FieldDescriptorBuilder {
            inner: FieldDescriptor::new(identifier, value_type),
        }
    }
}

/// Typed composition of descriptor overrides; later calls win, mirroring a
/// left-to-right merge of partial descriptors.
#[derive(Clone, Debug)]
pub struct FieldDescriptorBuilder {
    inner: FieldDescriptor,
}

impl FieldDescriptorBuilder {
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.inner.display_name = name.into();
        self
    }

    /// Skip the build-time range scan and use these bounds.
    pub fn precomputed_range(mut self, range: NumericRange) -> Self {
        self.inner.range = Some(range);
        self
    }

    /// Declare the exact distinct-value count up front.
    pub fn distinct_values(mut self, count: usize) -> Self {
        self.inner.distinct_estimate = DistinctEstimate::Exact(count);
        self
    }

    /// Force an unlimited estimate and disable distinct-value scanning.
    pub fn unlimited_values(mut self) -> Self {
        self.inner.distinct_estimate = DistinctEstimate::Unlimited;
        self
    }

    pub fn multiple_values_per_row(mut self, multi: bool) -> Self {
        self.inner.multiple_values_per_row = multi;
        self
    }

    pub fn type_constructor(mut self, name: impl Into<String>) -> Self {
        self.inner.type_constructor = Some(name.into());
        self
    }

    pub fn build(self) -> FieldDescriptor {
        self.inner
    }
}
