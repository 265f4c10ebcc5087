use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value held by a single attribute field. `Value::Null` means "not set".
pub type FieldValue = Value;

/// One editable field of an attribute instance as delivered by the gateway.
///
/// Only `field`, `value`, `mandatory` and `readonly` are interpreted; every
/// other key is display metadata and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(default, alias = "fieldName")]
    pub field: String,
    #[serde(default)]
    pub value: FieldValue,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(field: impl Into<String>, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            value,
            mandatory: false,
            readonly: false,
            extra: Map::new(),
        }
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_value(&self, value: FieldValue) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.value)
    }

    /// A mandatory field with no value blocks completion.
    pub fn blocks_completion(&self) -> bool {
        self.mandatory && self.is_empty()
    }

    pub fn caption(&self) -> Option<&str> {
        self.extra.get("caption").and_then(Value::as_str)
    }
}

/// Falsy scalars are empty: `null`, `false`, zero and `""`. Arrays and
/// objects always count as set, whatever they hold.
pub fn is_empty_value(value: &FieldValue) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_scalars_are_empty() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(is_empty_value(&value), "{value} should be empty");
        }
        for value in [json!(true), json!(-1), json!(0.5), json!("0"), json!([]), json!({})] {
            assert!(!is_empty_value(&value), "{value} should be set");
        }
    }

    #[test]
    fn unticked_mandatory_checkbox_blocks_completion() {
        let certified = FieldDescriptor::new("IsCertified", json!(false)).mandatory(true);
        assert!(certified.blocks_completion());
        assert!(!certified.with_value(json!(true)).blocks_completion());
    }

    #[test]
    fn descriptor_keeps_display_metadata() {
        let descriptor: FieldDescriptor = serde_json::from_value(json!({
            "fieldName": "HSCode",
            "value": "",
            "mandatory": true,
            "widgetType": "Text",
            "caption": "HS Code"
        }))
        .expect("descriptor");
        assert_eq!(descriptor.field, "HSCode");
        assert!(descriptor.blocks_completion());
        assert_eq!(descriptor.caption(), Some("HS Code"));
        assert_eq!(descriptor.extra.get("widgetType"), Some(&json!("Text")));
    }
}
