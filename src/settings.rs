//! Host application options
//!
//! The single settings category persisted to `<app-id>.json`. Field order
//! here is the key order of the file.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldKind, FieldSpec, Schema};

/// Allowed values of `strictStringOption`
pub const STRICT_STRING_VALUES: &[&str] = &["One", "Two", "Three"];

/// Value of an entry newly appended to `stringListOption`
pub const STRING_LIST_ENTRY_DEFAULT: &str = "One";

/// Inclusive range of `intOption`
pub const INT_OPTION_RANGE: (i32, i32) = (0, 10);
/// Inclusive range of `doubleOption`
pub const DOUBLE_OPTION_RANGE: (f64, f64) = (0.0, 10.0);
/// Inclusive range of `CustomObject::size`
pub const SIZE_RANGE: (i32, i32) = (0, 10);

/// GLFW key code of `J`
pub const KEY_J: i32 = 74;

/// Three-valued enumeration option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TriState {
    #[default]
    Value1,
    Value2,
    Value3,
}

impl TriState {
    /// Variant names as stored on disk
    pub const NAMES: &'static [&'static str] = &["Value1", "Value2", "Value3"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriState::Value1 => "Value1",
            TriState::Value2 => "Value2",
            TriState::Value3 => "Value3",
        }
    }
}

/// Runtime identity of a [`CustomObject`]. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(u64);

impl RecordId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Structured entry of `customObjectList`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomObject {
    #[serde(skip, default = "RecordId::next")]
    id: RecordId,
    pub name: String,
    pub size: i32,
}

impl CustomObject {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("name", FieldKind::String, ""),
        FieldSpec::new("size", FieldKind::Integer, "")
            .with_range(SIZE_RANGE.0 as f64, SIZE_RANGE.1 as f64),
    ];

    pub fn new(name: impl Into<String>, size: i32) -> Self {
        Self {
            id: RecordId::next(),
            name: name.into(),
            size,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }
}

impl Default for CustomObject {
    fn default() -> Self {
        Self::new("", 0)
    }
}

// Identity is not part of the value
impl PartialEq for CustomObject {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.size == other.size
    }
}

/// Persisted options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    // === General ===
    pub boolean_option: bool,
    /// Slider value in [`INT_OPTION_RANGE`]
    pub int_option: i32,
    /// Field value in [`DOUBLE_OPTION_RANGE`]
    pub double_option: f64,
    pub lenient_string_option: String,
    /// One of [`STRICT_STRING_VALUES`]
    pub strict_string_option: String,
    pub enum_option: TriState,

    // === Lists ===
    pub string_list_option: Vec<String>,

    // === Appearance ===
    /// 0xRRGGBB
    pub rgb_option: i32,
    /// 0xAARRGGBB, stored as a signed int
    pub argb_option: i32,
    /// Key code
    pub key_option: i32,
    /// Item identifier
    pub item_option: String,

    // === Objects ===
    pub custom_object_list: Vec<CustomObject>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            // General
            boolean_option: true,
            int_option: 7,
            double_option: 4.5,
            lenient_string_option: "example".to_string(),
            strict_string_option: STRICT_STRING_VALUES[0].to_string(),
            enum_option: TriState::Value1,

            // Lists
            string_list_option: vec!["One".to_string()],

            // Appearance
            rgb_option: 0xFF_FF_FF,
            argb_option: -1,
            key_option: KEY_J,
            item_option: "minecraft:stone".to_string(),

            // Objects
            custom_object_list: vec![CustomObject::new("one", 1), CustomObject::new("two", 2)],
        }
    }
}

impl Schema for Options {
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("booleanOption", FieldKind::Boolean, "general"),
        FieldSpec::new("intOption", FieldKind::Integer, "general")
            .with_range(INT_OPTION_RANGE.0 as f64, INT_OPTION_RANGE.1 as f64),
        FieldSpec::new("doubleOption", FieldKind::Double, "general")
            .with_range(DOUBLE_OPTION_RANGE.0, DOUBLE_OPTION_RANGE.1),
        FieldSpec::new("lenientStringOption", FieldKind::String, "general"),
        FieldSpec::new(
            "strictStringOption",
            FieldKind::StrictString(STRICT_STRING_VALUES),
            "general",
        ),
        FieldSpec::new("enumOption", FieldKind::Enum(TriState::NAMES), "general"),
        FieldSpec::new("stringListOption", FieldKind::StringList, "lists"),
        FieldSpec::new("rgbOption", FieldKind::Integer, "appearance"),
        FieldSpec::new("argbOption", FieldKind::Integer, "appearance"),
        FieldSpec::new("keyOption", FieldKind::Integer, "appearance"),
        FieldSpec::new("itemOption", FieldKind::String, "appearance"),
        FieldSpec::new(
            "customObjectList",
            FieldKind::RecordList(CustomObject::FIELDS),
            "objects",
        ),
    ];

    /// Brings values back within what the field table allows, so a saved
    /// file always decodes
    fn before_save(&mut self) {
        if !STRICT_STRING_VALUES.contains(&self.strict_string_option.as_str()) {
            log::warn!(
                "Invalid strictStringOption `{}`, resetting to `{}`",
                self.strict_string_option,
                STRICT_STRING_VALUES[0]
            );
            self.strict_string_option = STRICT_STRING_VALUES[0].to_string();
        }
        self.int_option = self.int_option.clamp(INT_OPTION_RANGE.0, INT_OPTION_RANGE.1);
        if self.double_option.is_nan() {
            self.double_option = Self::default().double_option;
        }
        self.double_option = self
            .double_option
            .clamp(DOUBLE_OPTION_RANGE.0, DOUBLE_OPTION_RANGE.1);
        for object in &mut self.custom_object_list {
            object.size = object.size.clamp(SIZE_RANGE.0, SIZE_RANGE.1);
        }
    }
}

impl Options {
    /// Append a record with default values and return its identity
    pub fn add_custom_object(&mut self) -> RecordId {
        self.push_custom_object(CustomObject::default())
    }

    /// Append a record and return its identity
    pub fn push_custom_object(&mut self, object: CustomObject) -> RecordId {
        // A cloned record would share its source's identity
        let object = CustomObject::new(object.name, object.size);
        let id = object.id;
        self.custom_object_list.push(object);
        id
    }

    /// Remove a record by identity. Other records are untouched.
    pub fn remove_custom_object(&mut self, id: RecordId) -> Option<CustomObject> {
        let index = self.custom_object_list.iter().position(|o| o.id == id)?;
        Some(self.custom_object_list.remove(index))
    }

    pub fn custom_object(&self, id: RecordId) -> Option<&CustomObject> {
        self.custom_object_list.iter().find(|o| o.id == id)
    }

    pub fn custom_object_mut(&mut self, id: RecordId) -> Option<&mut CustomObject> {
        self.custom_object_list.iter_mut().find(|o| o.id == id)
    }

    /// Append an entry to `stringListOption` with the list's entry default
    pub fn add_string_list_entry(&mut self) {
        self.string_list_option
            .push(STRING_LIST_ENTRY_DEFAULT.to_string());
    }

    /// Set one field from a JSON value by key.
    ///
    /// Only checks the Rust type; [`crate::form::apply`] is the validated
    /// entry point. Returns `Ok(false)` for an unknown key. Replacing
    /// `customObjectList` assigns fresh identities to every record.
    pub(crate) fn set_field(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<bool, serde_json::Error> {
        match key {
            "booleanOption" => self.boolean_option = serde_json::from_value(value)?,
            "intOption" => self.int_option = serde_json::from_value(value)?,
            "doubleOption" => self.double_option = serde_json::from_value(value)?,
            "lenientStringOption" => self.lenient_string_option = serde_json::from_value(value)?,
            "strictStringOption" => self.strict_string_option = serde_json::from_value(value)?,
            "enumOption" => self.enum_option = serde_json::from_value(value)?,
            "stringListOption" => self.string_list_option = serde_json::from_value(value)?,
            "rgbOption" => self.rgb_option = serde_json::from_value(value)?,
            "argbOption" => self.argb_option = serde_json::from_value(value)?,
            "keyOption" => self.key_option = serde_json::from_value(value)?,
            "itemOption" => self.item_option = serde_json::from_value(value)?,
            "customObjectList" => self.custom_object_list = serde_json::from_value(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.boolean_option);
        assert_eq!(options.int_option, 7);
        assert_eq!(options.double_option, 4.5);
        assert_eq!(options.lenient_string_option, "example");
        assert_eq!(options.strict_string_option, "One");
        assert_eq!(options.enum_option, TriState::Value1);
        assert_eq!(options.string_list_option, vec!["One".to_string()]);
        assert_eq!(options.rgb_option, 16777215);
        assert_eq!(options.argb_option, -1);
        assert_eq!(options.key_option, KEY_J);
        assert_eq!(options.item_option, "minecraft:stone");
        assert_eq!(
            options.custom_object_list,
            vec![CustomObject::new("one", 1), CustomObject::new("two", 2)]
        );
    }

    #[test]
    fn test_field_table_matches_serialized_keys() {
        let value = serde_json::to_value(Options::default()).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        let mut table: Vec<&str> = Options::FIELDS.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        table.sort_unstable();
        assert_eq!(keys, table);

        // Declaration order is file order
        let json = serde_json::to_string(&Options::default()).unwrap();
        let positions: Vec<usize> = Options::FIELDS
            .iter()
            .map(|f| json.find(&format!("\"{}\":", f.key)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let record = serde_json::to_string(&CustomObject::default()).unwrap();
        assert_eq!(record, r#"{"name":"","size":0}"#);
    }

    #[test]
    fn test_enum_names_match_serde() {
        for (name, variant) in TriState::NAMES
            .iter()
            .zip([TriState::Value1, TriState::Value2, TriState::Value3])
        {
            assert_eq!(serde_json::to_value(variant).unwrap(), json!(name));
            assert_eq!(variant.as_str(), *name);
        }
    }

    #[test]
    fn test_remove_by_identity() {
        let mut options = Options::default();
        options.custom_object_list.clear();
        let a = options.push_custom_object(CustomObject::new("a", 1));
        let b = options.push_custom_object(CustomObject::new("b", 2));
        let c = options.push_custom_object(CustomObject::new("c", 3));

        let removed = options.remove_custom_object(b).unwrap();
        assert_eq!(removed, CustomObject::new("b", 2));
        assert_eq!(
            options.custom_object_list,
            vec![CustomObject::new("a", 1), CustomObject::new("c", 3)]
        );
        assert_eq!(options.custom_object(a).unwrap().name, "a");
        assert_eq!(options.custom_object(c).unwrap().size, 3);
        assert!(options.remove_custom_object(b).is_none());
    }

    #[test]
    fn test_identical_records_stay_distinct() {
        let mut options = Options::default();
        options.custom_object_list.clear();
        let first = options.add_custom_object();
        let second = options.add_custom_object();
        assert_ne!(first, second);

        options.custom_object_mut(second).unwrap().size = 5;
        options.remove_custom_object(first);
        assert_eq!(options.custom_object_list.len(), 1);
        assert_eq!(options.custom_object_list[0].size, 5);
    }

    #[test]
    fn test_pushed_clone_gets_new_identity() {
        let mut options = Options::default();
        let original = options.custom_object_list[0].clone();
        let id = options.push_custom_object(original.clone());
        assert_ne!(id, original.id());
        options.remove_custom_object(id);
        assert_eq!(options.custom_object_list.len(), 2);
    }

    #[test]
    fn test_before_save_clamps() {
        let mut options = Options::default();
        options.int_option = 42;
        options.double_option = -3.0;
        options.custom_object_list[0].size = 99;
        options.before_save();
        assert_eq!(options.int_option, 10);
        assert_eq!(options.double_option, 0.0);
        assert_eq!(options.custom_object_list[0].size, 10);

        let mut defaults = Options::default();
        defaults.before_save();
        assert_eq!(defaults, Options::default());
    }

    #[test]
    fn test_before_save_resets_disallowed_strict_string() {
        let mut options = Options::default();
        options.strict_string_option = "Three".to_string();
        options.before_save();
        assert_eq!(options.strict_string_option, "Three");

        options.strict_string_option = "Four".to_string();
        options.double_option = f64::NAN;
        options.before_save();
        assert_eq!(options.strict_string_option, "One");
        assert_eq!(options.double_option, 4.5);

        let json = crate::codec::encode(&options).unwrap();
        let decoded: Options = crate::codec::decode(json.as_bytes()).unwrap();
        assert_eq!(decoded, options);
    }

    #[test]
    fn test_set_field() {
        let mut options = Options::default();
        assert!(options.set_field("intOption", json!(3)).unwrap());
        assert!(options.set_field("enumOption", json!("Value3")).unwrap());
        assert_eq!(options.int_option, 3);
        assert_eq!(options.enum_option, TriState::Value3);
        assert!(!options.set_field("nope", json!(1)).unwrap());
        assert!(options.set_field("intOption", json!("three")).is_err());
        assert_eq!(options.int_option, 3);
    }

    #[test]
    fn test_string_list_entry_default() {
        let mut options = Options::default();
        options.add_string_list_entry();
        assert_eq!(options.string_list_option, vec!["One", "One"]);
    }
}
