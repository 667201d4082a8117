use crate::types::Value;
use std::fmt;

/// Equality predicate on one field: matches rows where the field contains
/// the value.
#[derive(Clone, Debug)]
pub struct ValueFilter {
    pub field: String,
    pub value: Value,
    /// Advisory label for display surfaces; excluded from equality.
    pub display_name: Option<String>,
}

impl ValueFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

impl PartialEq for ValueFilter {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.value == other.value
    }
}

impl Eq for ValueFilter {}

/// A row predicate over one field.
///
/// Filters compare structurally: same kind, same field identifier, same
/// value. Two filters that differ only in display name are the same filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Value(ValueFilter),
}

impl Filter {
    /// Shorthand for the common equality filter.
    pub fn value(field: impl Into<String>, value: impl Into<Value>) -> Filter {
        Filter::Value(ValueFilter::new(field, value))
    }

    pub fn field_identifier(&self) -> &str {
        match self {
            Filter::Value(f) => &f.field,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Value(vf) => {
                let name = vf.display_name.as_deref().unwrap_or(&vf.field);
                write!(f, "{name} = {}", vf.value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_display_name() {
        let plain = Filter::Value(ValueFilter::new("color", "red"));
        let labeled = Filter::Value(ValueFilter::new("color", "red").with_display_name("Colour"));
        assert_eq!(plain, labeled);

        assert_ne!(plain, Filter::value("color", "blue"));
        assert_ne!(plain, Filter::value("size", "red"));
    }

    #[test]
    fn display_prefers_the_label() {
        let f = Filter::Value(ValueFilter::new("qty", 3i64).with_display_name("Quantity"));
        assert_eq!(f.to_string(), "Quantity = 3");
        assert_eq!(Filter::value("qty", 3i64).to_string(), "qty = 3");
    }
}
