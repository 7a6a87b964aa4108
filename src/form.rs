//! Schema-driven option form
//!
//! A rendering-agnostic description of the editable options, built from the
//! field table and the live values. Front ends lay it out however they like
//! and write edits back through [`apply`] / [`reset_field`].

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::codec::{self, CodecError};
use crate::schema::{FieldKind, FieldSpec, Schema, find_field};
use crate::settings::{CustomObject, Options, RecordId};

/// Errors from editing a field through the form
#[derive(Error, Debug)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error(transparent)]
    Invalid(#[from] CodecError),

    #[error("field `{field}` value {value} is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One editable value
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub spec: &'static FieldSpec,
    pub value: Value,
    pub default: Value,
}

impl FormEntry {
    pub fn key(&self) -> &'static str {
        self.spec.key
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }
}

/// One record of a record list, rendered as its own group
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    /// Position label, e.g. `#3`; derived at build time, never stored
    pub label: String,
    /// Identity to pass to [`Options::remove_custom_object`]
    pub id: RecordId,
    pub entries: Vec<FormEntry>,
}

/// Entries sharing a category, in field declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct FormCategory {
    pub name: &'static str,
    pub entries: Vec<FormEntry>,
    pub groups: Vec<RecordGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub categories: Vec<FormCategory>,
}

impl Form {
    pub fn build(options: &Options) -> Result<Self, FormError> {
        let values = to_map(options)?;
        let defaults = codec::defaults::<Options>()?;
        let record_defaults = to_map(&CustomObject::default())?;

        let mut categories: Vec<FormCategory> = Vec::new();
        for spec in Options::FIELDS {
            let index = match categories.iter().position(|c| c.name == spec.category) {
                Some(i) => i,
                None => {
                    categories.push(FormCategory {
                        name: spec.category,
                        entries: Vec::new(),
                        groups: Vec::new(),
                    });
                    categories.len() - 1
                }
            };
            let category = &mut categories[index];

            match spec.kind {
                FieldKind::RecordList(fields) => {
                    for (i, object) in options.custom_object_list.iter().enumerate() {
                        let record = to_map(object)?;
                        category.groups.push(RecordGroup {
                            label: format!("#{}", i + 1),
                            id: object.id(),
                            entries: entries(fields, &record, &record_defaults),
                        });
                    }
                }
                _ => category.entries.extend(entries(
                    std::slice::from_ref(spec),
                    &values,
                    &defaults,
                )),
            }
        }

        Ok(Self { categories })
    }

    pub fn entry(&self, key: &str) -> Option<&FormEntry> {
        self.categories
            .iter()
            .flat_map(|c| c.entries.iter())
            .find(|e| e.key() == key)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for category in &self.categories {
            writeln!(f, "[{}]", category.name)?;
            for entry in &category.entries {
                write_entry(f, entry, "  ")?;
            }
            for group in &category.groups {
                writeln!(f, "  {}", group.label)?;
                for entry in &group.entries {
                    write_entry(f, entry, "    ")?;
                }
            }
        }
        Ok(())
    }
}

fn write_entry(f: &mut fmt::Formatter<'_>, entry: &FormEntry, indent: &str) -> fmt::Result {
    write!(f, "{indent}{} = {}", entry.key(), entry.value)?;
    if !entry.is_default() {
        write!(f, " (default {})", entry.default)?;
    }
    writeln!(f)
}

fn entries(
    fields: &'static [FieldSpec],
    values: &Map<String, Value>,
    defaults: &Map<String, Value>,
) -> Vec<FormEntry> {
    fields
        .iter()
        .map(|spec| FormEntry {
            spec,
            value: values.get(spec.key).cloned().unwrap_or(Value::Null),
            default: defaults.get(spec.key).cloned().unwrap_or(Value::Null),
        })
        .collect()
}

fn to_map<T: serde::Serialize>(value: &T) -> Result<Map<String, Value>, FormError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject.into()),
    }
}

/// Set one field, validated against the field table
pub fn apply(options: &mut Options, key: &str, value: Value) -> Result<(), FormError> {
    let spec = find_field(Options::FIELDS, key)
        .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
    codec::validate_field(spec, &value, key)?;
    check_range(spec, &value, key)?;
    if let FieldKind::RecordList(fields) = spec.kind {
        for (i, record) in value.as_array().into_iter().flatten().enumerate() {
            for field in fields {
                if let Some(v) = record.get(field.key) {
                    check_range(field, v, &format!("{key}[{i}].{}", field.key))?;
                }
            }
        }
    }

    options.set_field(key, value)?;
    Ok(())
}

/// Restore one field to its declared default
pub fn reset_field(options: &mut Options, key: &str) -> Result<(), FormError> {
    let default = codec::defaults::<Options>()?
        .remove(key)
        .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
    options.set_field(key, default)?;
    Ok(())
}

fn check_range(spec: &FieldSpec, value: &Value, path: &str) -> Result<(), FormError> {
    match (spec.range, value.as_f64()) {
        (Some((min, max)), Some(v)) if !spec.in_range(v) => Err(FormError::OutOfRange {
            field: path.to_string(),
            value: v,
            min,
            max,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TriState;
    use serde_json::json;

    #[test]
    fn test_categories_follow_declaration_order() {
        let form = Form::build(&Options::default()).unwrap();
        let names: Vec<&str> = form.categories.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["general", "lists", "appearance", "objects"]);

        let general: Vec<&str> = form.categories[0].entries.iter().map(|e| e.key()).collect();
        assert_eq!(
            general,
            vec![
                "booleanOption",
                "intOption",
                "doubleOption",
                "lenientStringOption",
                "strictStringOption",
                "enumOption"
            ]
        );
    }

    #[test]
    fn test_entries_track_defaults() {
        let mut options = Options::default();
        options.int_option = 2;
        let form = Form::build(&options).unwrap();

        let int = form.entry("intOption").unwrap();
        assert_eq!(int.value, json!(2));
        assert_eq!(int.default, json!(7));
        assert!(!int.is_default());
        assert_eq!(int.spec.range, Some((0.0, 10.0)));
        assert!(form.entry("booleanOption").unwrap().is_default());
    }

    #[test]
    fn test_record_groups_labelled_by_position() {
        let mut options = Options::default();
        let first = options.custom_object_list[0].id();
        options.remove_custom_object(first);
        let added = options.add_custom_object();

        let form = Form::build(&options).unwrap();
        let objects = form.categories.iter().find(|c| c.name == "objects").unwrap();
        assert!(objects.entries.is_empty());
        let labels: Vec<&str> = objects.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["#1", "#2"]);
        assert_eq!(objects.groups[1].id, added);
        assert_eq!(objects.groups[0].entries[0].value, json!("two"));
        assert_eq!(objects.groups[1].entries[1].default, json!(0));
    }

    #[test]
    fn test_apply_validates() {
        let mut options = Options::default();
        apply(&mut options, "enumOption", json!("Value2")).unwrap();
        apply(&mut options, "doubleOption", json!(9.5)).unwrap();
        assert_eq!(options.enum_option, TriState::Value2);
        assert_eq!(options.double_option, 9.5);

        assert!(matches!(
            apply(&mut options, "intOption", json!(11)),
            Err(FormError::OutOfRange { .. })
        ));
        assert!(matches!(
            apply(&mut options, "strictStringOption", json!("Four")),
            Err(FormError::Invalid(CodecError::NotAllowed { .. }))
        ));
        assert!(matches!(
            apply(&mut options, "booleanOption", json!(1)),
            Err(FormError::Invalid(CodecError::WrongType { .. }))
        ));
        assert!(matches!(
            apply(&mut options, "missing", json!(1)),
            Err(FormError::UnknownField(_))
        ));
        assert!(matches!(
            apply(
                &mut options,
                "customObjectList",
                json!([{"name": "a", "size": 20}])
            ),
            Err(FormError::OutOfRange { .. })
        ));
        assert_eq!(options.int_option, 7);
    }

    #[test]
    fn test_reset_field() {
        let mut options = Options::default();
        options.item_option = "minecraft:dirt".to_string();
        options.custom_object_list.clear();
        reset_field(&mut options, "itemOption").unwrap();
        reset_field(&mut options, "customObjectList").unwrap();
        assert_eq!(options, Options::default());
        assert!(matches!(
            reset_field(&mut options, "missing"),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn test_display_marks_changed_values() {
        let mut options = Options::default();
        options.boolean_option = false;
        let text = Form::build(&options).unwrap().to_string();
        assert!(text.starts_with("[general]\n  booleanOption = false (default true)\n"));
        assert!(text.contains("  intOption = 7\n"));
        assert!(text.contains("  #2\n    name = \"two\" (default \"\")\n    size = 2 (default 0)\n"));
    }
}
