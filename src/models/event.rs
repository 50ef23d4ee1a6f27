use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    errors::{Error, Result},
    utils::record_id::serialize_key,
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub owner: RecordId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dresscode: String,
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateEvent {
    pub id: RecordId,
    pub owner: RecordId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub dresscode: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct UpdateEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub dresscode: String,
    pub metadata: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

pub fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// `ends_at` may be absent; when present it must not precede `starts_at`.
pub fn validate_time_window(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> Result<()> {
    match ends_at {
        Some(ends_at) if ends_at < starts_at => Err(Error::invalid(
            "ends_at",
            "End time must not be before start time.",
        )),
        _ => Ok(()),
    }
}

impl Event {
    pub fn is_owned_by(&self, user: &RecordId) -> bool {
        &self.owner == user
    }
}
