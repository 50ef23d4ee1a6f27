use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use surrealdb::{RecordId, engine::any::Any, method::Query};
use tracing::info;
use validator::Validate;

use crate::{
    consts::{
        index::UNIQ_CUSTOM_FIELD_KEY,
        table::{CUSTOM_FIELD_DEFINITION_TABLE, CUSTOM_FIELD_VALUE_TABLE},
    },
    db::{self, Db, is_unique_violation},
    errors::{Error, Result},
    models::{
        custom_field::{
            CreateCustomFieldDefinition, CreateCustomFieldValue, CustomFieldDefinition,
            CustomFieldType, CustomFieldValue,
        },
        participation::Participation,
    },
    utils::{
        slug::{is_slug, to_slug},
        validator::{validate_not_blank, validate_slug},
    },
};

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CreateDefinitionRequest {
    /// Derived from the label when omitted.
    #[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
    pub key: Option<String>,
    #[validate(length(min = 1, max = 120), custom(function = "validate_not_blank"))]
    pub label: String,
    pub field_type: CustomFieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub position: i64,
}

pub async fn create_definition(
    sdb: &Db,
    event_id: &RecordId,
    input: CreateDefinitionRequest,
) -> Result<CustomFieldDefinition> {
    let key = match input.key {
        Some(key) => key,
        None => to_slug(&input.label).chars().take(64).collect(),
    };
    if !is_slug(&key) {
        return Err(Error::invalid(
            "key",
            "Key may only contain lowercase letters, digits, '-' and '_'.",
        ));
    }
    let row = CreateCustomFieldDefinition::new(
        event_id,
        key,
        input.label.trim().to_string(),
        input.field_type,
        input.required,
        input.options,
        input.position,
    )?;
    let id = row.id.clone();

    let result = db::insert(sdb, CUSTOM_FIELD_DEFINITION_TABLE, row).await;
    if is_unique_violation(&result, UNIQ_CUSTOM_FIELD_KEY) {
        return Err(Error::invalid(
            "key",
            "A custom field with this key already exists for this event.",
        ));
    }
    result?;

    let definition: Option<CustomFieldDefinition> = sdb.select(id).await?;
    definition.ok_or(Error::InternalServerError)
}

/// Ordered by position, then creation.
pub async fn list_definitions(sdb: &Db, event_id: &RecordId) -> Result<Vec<CustomFieldDefinition>> {
    let mut definitions: Vec<CustomFieldDefinition> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", CUSTOM_FIELD_DEFINITION_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    definitions.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    Ok(definitions)
}

pub async fn list_values(sdb: &Db, participations: Vec<RecordId>) -> Result<Vec<CustomFieldValue>> {
    let mut values = Vec::new();
    for participation in participations {
        let mut rows: Vec<CustomFieldValue> = sdb
            .query("SELECT * FROM type::table($table) WHERE participation = $participation;")
            .bind(("table", CUSTOM_FIELD_VALUE_TABLE))
            .bind(("participation", participation))
            .await?
            .take(0)?;
        values.append(&mut rows);
    }
    Ok(values)
}

/// Validates a whole batch of `{key: value}` answers against the event schema. Any unknown
/// key or mistyped value fails the batch before anything is written.
pub async fn prepare_answers(
    sdb: &Db,
    participation: &Participation,
    answers: &HashMap<String, Value>,
) -> Result<Vec<CreateCustomFieldValue>> {
    let definitions = list_definitions(sdb, &participation.event).await?;
    let existing = list_values(sdb, vec![participation.id.clone()]).await?;

    let mut keys: Vec<&String> = answers.keys().collect();
    keys.sort();

    let mut rows = Vec::with_capacity(keys.len());
    for key in keys {
        let definition = definitions
            .iter()
            .find(|definition| &definition.key == key)
            .ok_or_else(|| Error::invalid(key.as_str(), "Unknown custom field."))?;
        let value = definition.validate_value(&answers[key])?;
        let previous = existing.iter().find(|row| row.definition == definition.id);
        rows.push(CreateCustomFieldValue::new(
            definition,
            participation,
            value,
            previous,
        )?);
    }
    Ok(rows)
}

/// Appends a replace-by-key of `rows` to an open transaction. Rows built from a previous
/// answer carry its id, so each key is overwritten in place.
pub fn answer_statements<'a>(
    mut query: Query<'a, Any>,
    rows: Vec<CreateCustomFieldValue>,
) -> Query<'a, Any> {
    for (i, row) in rows.into_iter().enumerate() {
        let (id_param, row_param) = (format!("answer_{i}"), format!("answer_row_{i}"));
        query = query
            .query(format!("UPSERT ${id_param} CONTENT ${row_param};"))
            .bind((id_param, row.id.clone()))
            .bind((row_param, row));
    }
    query
}

/// Upserts one value per submitted key, all or nothing.
pub async fn save_answers(
    sdb: &Db,
    participation: &Participation,
    answers: &HashMap<String, Value>,
) -> Result<Vec<CustomFieldValue>> {
    let rows = prepare_answers(sdb, participation, answers).await?;
    let count = rows.len();
    db::commit(answer_statements(db::begin(sdb), rows)).await?;
    info!(participation = %participation.id, count, "custom field answers saved");
    list_values(sdb, vec![participation.id.clone()]).await
}
