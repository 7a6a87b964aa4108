//! JSON encoding of schema instances
//!
//! Encoding is pretty-printed with keys in field declaration order.
//! Decoding starts from declared defaults: a key missing from the document
//! keeps its default, a key of the wrong shape fails the whole document,
//! and keys outside the field table are logged and ignored.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::{FieldKind, FieldSpec, Schema, find_field};

/// Errors produced while encoding or decoding a document
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document root is not an object")]
    NotAnObject,

    #[error("field `{field}` is not a valid {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field `{field}` has disallowed value {value:?}")]
    NotAllowed { field: String, value: String },
}

/// Encode an instance as pretty-printed JSON
pub fn encode<S: Schema>(instance: &S) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(instance)?)
}

/// Decode a document, falling back to declared defaults for missing fields
pub fn decode<S: Schema>(bytes: &[u8]) -> Result<S, CodecError> {
    let document: Value = serde_json::from_slice(bytes)?;
    let Value::Object(map) = &document else {
        return Err(CodecError::NotAnObject);
    };
    validate_object(S::FIELDS, map, None)?;
    Ok(serde_json::from_value(document)?)
}

/// Serialized default instance, keyed by field
pub fn defaults<S: Schema>() -> Result<Map<String, Value>, CodecError> {
    match serde_json::to_value(S::default())? {
        Value::Object(map) => Ok(map),
        _ => Err(CodecError::NotAnObject),
    }
}

/// Check one value against its field declaration.
///
/// `path` names the field in error messages.
pub fn validate_field(spec: &FieldSpec, value: &Value, path: &str) -> Result<(), CodecError> {
    let wrong_type = || CodecError::WrongType {
        field: path.to_string(),
        expected: spec.kind.name(),
    };

    match spec.kind {
        FieldKind::Boolean => value.is_boolean().then_some(()).ok_or_else(wrong_type),
        FieldKind::Integer => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(|_| ())
            .ok_or_else(wrong_type),
        FieldKind::Double => value.is_number().then_some(()).ok_or_else(wrong_type),
        FieldKind::String => value.is_string().then_some(()).ok_or_else(wrong_type),
        FieldKind::StrictString(allowed) | FieldKind::Enum(allowed) => {
            let s = value.as_str().ok_or_else(wrong_type)?;
            if allowed.contains(&s) {
                Ok(())
            } else {
                Err(CodecError::NotAllowed {
                    field: path.to_string(),
                    value: s.to_string(),
                })
            }
        }
        FieldKind::StringList => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            if items.iter().all(Value::is_string) {
                Ok(())
            } else {
                Err(wrong_type())
            }
        }
        FieldKind::RecordList(fields) => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                let record = item.as_object().ok_or_else(|| CodecError::WrongType {
                    field: item_path.clone(),
                    expected: "record",
                })?;
                validate_object(fields, record, Some(&item_path))?;
            }
            Ok(())
        }
    }
}

fn validate_object(
    fields: &'static [FieldSpec],
    map: &Map<String, Value>,
    prefix: Option<&str>,
) -> Result<(), CodecError> {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match find_field(fields, key) {
            Some(spec) => validate_field(spec, value, &path)?,
            None => log::warn!("Ignoring unknown config field `{}`", path),
        }
    }
    Ok(())
}
