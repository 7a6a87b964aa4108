//! Field table describing a settings schema
//!
//! Every persisted field is declared once: JSON key, type tag, presentation
//! category and an optional numeric range. The codec validates documents
//! against the table and the form module renders from it.

use serde::{Serialize, de::DeserializeOwned};

/// Type tag of a single field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Boolean,
    /// 32-bit signed integer
    Integer,
    Double,
    /// Free-form string
    String,
    /// String restricted to a fixed set of values
    StrictString(&'static [&'static str]),
    /// Enumeration, stored as the variant name
    Enum(&'static [&'static str]),
    StringList,
    /// Ordered list of structured sub-records with their own field table
    RecordList(&'static [FieldSpec]),
}

impl FieldKind {
    /// Human-readable type name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Double => "double",
            FieldKind::String => "string",
            FieldKind::StrictString(_) => "enumerated string",
            FieldKind::Enum(_) => "enumeration",
            FieldKind::StringList => "list of strings",
            FieldKind::RecordList(_) => "list of records",
        }
    }

    /// Allowed values for restricted kinds
    pub fn allowed(&self) -> Option<&'static [&'static str]> {
        match self {
            FieldKind::StrictString(values) | FieldKind::Enum(values) => Some(values),
            _ => None,
        }
    }
}

/// Declaration of one persisted field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// JSON key
    pub key: &'static str,
    pub kind: FieldKind,
    /// Presentation category (ignored for sub-record fields)
    pub category: &'static str,
    /// Inclusive range for numeric fields
    pub range: Option<(f64, f64)>,
}

impl FieldSpec {
    pub const fn new(key: &'static str, kind: FieldKind, category: &'static str) -> Self {
        Self {
            key,
            kind,
            category,
            range: None,
        }
    }

    pub const fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Whether a numeric value lies inside the declared range
    pub fn in_range(&self, value: f64) -> bool {
        match self.range {
            Some((min, max)) => (min..=max).contains(&value),
            None => true,
        }
    }
}

/// Look up a field by key
pub fn find_field(fields: &'static [FieldSpec], key: &str) -> Option<&'static FieldSpec> {
    fields.iter().find(|f| f.key == key)
}

/// A settings category that can be persisted as one JSON document.
///
/// `Default` must produce the declared default of every field; the codec
/// relies on it to fill fields missing from a document.
pub trait Schema: Serialize + DeserializeOwned + Default + Send + 'static {
    /// Field table, in declaration order
    const FIELDS: &'static [FieldSpec];

    /// Called right before the instance is encoded for saving
    fn before_save(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUB: &[FieldSpec] = &[FieldSpec::new("size", FieldKind::Integer, "").with_range(0.0, 10.0)];

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::new("flag", FieldKind::Boolean, "general"),
        FieldSpec::new("mode", FieldKind::Enum(&["A", "B"]), "general"),
        FieldSpec::new("records", FieldKind::RecordList(SUB), "records"),
    ];

    #[test]
    fn test_find_field() {
        assert_eq!(find_field(FIELDS, "mode").map(|f| f.key), Some("mode"));
        assert!(find_field(FIELDS, "missing").is_none());
    }

    #[test]
    fn test_allowed_values() {
        assert_eq!(FIELDS[1].kind.allowed(), Some(&["A", "B"][..]));
        assert_eq!(FIELDS[0].kind.allowed(), None);
    }

    #[test]
    fn test_range() {
        let size = &SUB[0];
        assert!(size.in_range(0.0));
        assert!(size.in_range(10.0));
        assert!(!size.in_range(10.5));
        assert!(FIELDS[0].in_range(1e9));
    }
}
