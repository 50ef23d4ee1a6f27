use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    consts::table::{DOCUMENT_TABLE, EVENT_IMAGE_TABLE},
    utils::record_id::{new_record_id, serialize_key},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Document {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub uploaded_by: RecordId,
    #[serde(default)]
    pub title: String,
    pub file: String, // ! object store reference
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateDocument {
    pub id: RecordId,
    pub event: RecordId,
    pub uploaded_by: RecordId,
    pub title: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
}

impl CreateDocument {
    pub fn new(id: RecordId, event: &RecordId, uploaded_by: &RecordId, title: String, file: String) -> Self {
        Self {
            id,
            event: event.clone(),
            uploaded_by: uploaded_by.clone(),
            title,
            file,
            created_at: Utc::now(),
        }
    }

    pub fn fresh_id() -> RecordId {
        new_record_id(DOCUMENT_TABLE)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventImage {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub uploaded_by: RecordId,
    #[serde(default)]
    pub caption: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateEventImage {
    pub id: RecordId,
    pub event: RecordId,
    pub uploaded_by: RecordId,
    pub caption: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl CreateEventImage {
    pub fn new(id: RecordId, event: &RecordId, uploaded_by: &RecordId, caption: String, image: String) -> Self {
        Self {
            id,
            event: event.clone(),
            uploaded_by: uploaded_by.clone(),
            caption,
            image,
            created_at: Utc::now(),
        }
    }

    pub fn fresh_id() -> RecordId {
        new_record_id(EVENT_IMAGE_TABLE)
    }
}
