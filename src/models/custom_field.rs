use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::RecordId;

use crate::{
    consts::table::{CUSTOM_FIELD_DEFINITION_TABLE, CUSTOM_FIELD_VALUE_TABLE},
    errors::{Error, Result},
    models::participation::Participation,
    utils::record_id::{new_record_id, serialize_key},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldType {
    Text,
    Number,
    Bool,
    Enum,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CustomFieldDefinition {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    pub key: String, // ! unique per event
    pub label: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateCustomFieldDefinition {
    pub id: RecordId,
    pub event: RecordId,
    pub key: String,
    pub label: String,
    pub field_type: CustomFieldType,
    pub required: bool,
    pub options: Vec<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl CreateCustomFieldDefinition {
    pub fn new(
        event: &RecordId,
        key: String,
        label: String,
        field_type: CustomFieldType,
        required: bool,
        options: Vec<String>,
        position: i64,
    ) -> Result<Self> {
        let options = validate_options(field_type, options)?;
        Ok(Self {
            id: new_record_id(CUSTOM_FIELD_DEFINITION_TABLE),
            event: event.clone(),
            key,
            label,
            field_type,
            required,
            options,
            position,
            created_at: Utc::now(),
        })
    }
}

/// Enum fields need at least one non-empty string option; other types take none.
pub fn validate_options(field_type: CustomFieldType, options: Vec<String>) -> Result<Vec<String>> {
    match field_type {
        CustomFieldType::Enum => {
            if options.is_empty() {
                return Err(Error::invalid(
                    "options",
                    "Enum fields require a non-empty list of options.",
                ));
            }
            if options.iter().any(|option| option.trim().is_empty()) {
                return Err(Error::invalid(
                    "options",
                    "Enum options must be non-empty strings.",
                ));
            }
            Ok(options)
        }
        _ if !options.is_empty() => Err(Error::invalid(
            "options",
            "Options are only allowed for enum fields.",
        )),
        _ => Ok(options),
    }
}

/// A typed answer. Stored as `{"type": .., "value": ..}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Enum(String),
}

impl FieldValue {
    /// The bare JSON value as it was submitted.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) | FieldValue::Enum(text) => Value::String(text.clone()),
            FieldValue::Number(number) => serde_json::Number::from_f64(*number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Bool(flag) => Value::Bool(*flag),
        }
    }
}

impl CustomFieldDefinition {
    /// Converts a raw JSON answer into a [`FieldValue`] of this field's type.
    /// `None` means "no answer", which only optional fields accept.
    pub fn validate_value(&self, raw: &Value) -> Result<Option<FieldValue>> {
        let field = self.key.as_str();
        if raw.is_null() {
            if self.required {
                return Err(Error::invalid(field, "This field is required."));
            }
            return Ok(None);
        }
        match self.field_type {
            CustomFieldType::Text => {
                let Value::String(text) = raw else {
                    return Err(Error::invalid(field, "Expected a string."));
                };
                if self.required && text.trim().is_empty() {
                    return Err(Error::invalid(field, "This field is required."));
                }
                Ok(Some(FieldValue::Text(text.clone())))
            }
            // serde_json never treats booleans as numbers, so `as_f64` rejects them
            CustomFieldType::Number => raw
                .as_f64()
                .map(|number| Some(FieldValue::Number(number)))
                .ok_or_else(|| Error::invalid(field, "Expected a number.")),
            CustomFieldType::Bool => raw
                .as_bool()
                .map(|flag| Some(FieldValue::Bool(flag)))
                .ok_or_else(|| Error::invalid(field, "Expected a boolean.")),
            CustomFieldType::Enum => {
                let Value::String(choice) = raw else {
                    return Err(Error::invalid(field, "Expected a string."));
                };
                if !self.options.contains(choice) {
                    return Err(Error::invalid(
                        field,
                        format!("'{choice}' is not one of the allowed options."),
                    ));
                }
                Ok(Some(FieldValue::Enum(choice.clone())))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CustomFieldValue {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub definition: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub participation: RecordId,
    pub value: Option<FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateCustomFieldValue {
    pub id: RecordId,
    pub definition: RecordId,
    pub participation: RecordId,
    pub value: Option<FieldValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreateCustomFieldValue {
    /// Refuses to pair a definition and a participation from different events.
    /// A `previous` answer keeps its id and creation time so the row is replaced in place.
    pub fn new(
        definition: &CustomFieldDefinition,
        participation: &Participation,
        value: Option<FieldValue>,
        previous: Option<&CustomFieldValue>,
    ) -> Result<Self> {
        if definition.event != participation.event {
            return Err(Error::invalid(
                definition.key.as_str(),
                "Custom field does not belong to this event.",
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: previous
                .map(|row| row.id.clone())
                .unwrap_or_else(|| new_record_id(CUSTOM_FIELD_VALUE_TABLE)),
            definition: definition.id.clone(),
            participation: participation.id.clone(),
            value,
            created_at: previous.map(|row| row.created_at).unwrap_or(now),
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::participation::{CreateParticipation, RsvpStatus};

    fn definition(field_type: CustomFieldType, required: bool, options: &[&str]) -> CustomFieldDefinition {
        CustomFieldDefinition {
            id: RecordId::from_table_key("custom_field_definitions", "d1"),
            event: RecordId::from_table_key("events", "e1"),
            key: "drink".to_string(),
            label: "Drink".to_string(),
            field_type,
            required,
            options: options.iter().map(|o| o.to_string()).collect(),
            position: 0,
            created_at: Utc::now(),
        }
    }

    fn participation(event: &str) -> Participation {
        let row = CreateParticipation::new(
            &RecordId::from_table_key("events", event),
            &RecordId::from_table_key("users", "u1"),
            RsvpStatus::Pending,
        );
        Participation {
            id: row.id,
            event: row.event,
            user: row.user,
            rsvp_status: row.rsvp_status,
            plus_one_count: 0,
            allergies: String::new(),
            notes: String::new(),
            dresscode_visible: true,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    #[test]
    fn test_enum_answers_must_match_an_option() {
        let field = definition(CustomFieldType::Enum, false, &["water", "juice"]);
        assert!(field.validate_value(&json!("soda")).is_err());
        assert_eq!(
            field.validate_value(&json!("juice")).unwrap(),
            Some(FieldValue::Enum("juice".to_string()))
        );
    }

    #[test]
    fn test_number_rejects_booleans() {
        let field = definition(CustomFieldType::Number, false, &[]);
        assert!(field.validate_value(&json!(true)).is_err());
        assert_eq!(
            field.validate_value(&json!(3)).unwrap(),
            Some(FieldValue::Number(3.0))
        );
    }

    #[test]
    fn test_required_text_rejects_blank_and_null() {
        let field = definition(CustomFieldType::Text, true, &[]);
        assert!(field.validate_value(&json!("   ")).is_err());
        assert!(field.validate_value(&Value::Null).is_err());
        assert!(field.validate_value(&json!(12)).is_err());

        let optional = definition(CustomFieldType::Text, false, &[]);
        assert_eq!(optional.validate_value(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_bool_requires_boolean() {
        let field = definition(CustomFieldType::Bool, false, &[]);
        assert!(field.validate_value(&json!("yes")).is_err());
        assert_eq!(
            field.validate_value(&json!(false)).unwrap(),
            Some(FieldValue::Bool(false))
        );
    }

    #[test]
    fn test_options_rules() {
        assert!(validate_options(CustomFieldType::Enum, vec![]).is_err());
        assert!(validate_options(CustomFieldType::Enum, vec![" ".into()]).is_err());
        assert!(validate_options(CustomFieldType::Text, vec!["a".into()]).is_err());
        assert!(validate_options(CustomFieldType::Bool, vec![]).is_ok());
    }

    #[test]
    fn test_value_refuses_foreign_participation() {
        let field = definition(CustomFieldType::Bool, false, &[]);
        assert!(CreateCustomFieldValue::new(&field, &participation("e1"), None, None).is_ok());
        assert!(CreateCustomFieldValue::new(&field, &participation("e2"), None, None).is_err());
    }

    #[test]
    fn test_field_value_wire_shape() {
        let stored = serde_json::to_value(FieldValue::Number(2.5)).unwrap();
        assert_eq!(stored, json!({ "type": "number", "value": 2.5 }));
        assert_eq!(FieldValue::Enum("juice".into()).to_json(), json!("juice"));
    }
}
