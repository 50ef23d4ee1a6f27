use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    consts::table::PARTICIPATION_TABLE,
    utils::record_id::{new_record_id, serialize_key},
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Participation {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub user: RecordId,
    pub rsvp_status: RsvpStatus,
    #[serde(default)]
    pub plus_one_count: u16,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub dresscode_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateParticipation {
    pub id: RecordId,
    pub event: RecordId,
    pub user: RecordId,
    pub rsvp_status: RsvpStatus,
    pub plus_one_count: u16,
    pub allergies: String,
    pub notes: String,
    pub dresscode_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreateParticipation {
    pub fn new(event: &RecordId, user: &RecordId, rsvp_status: RsvpStatus) -> Self {
        let now = Utc::now();
        Self {
            id: new_record_id(PARTICIPATION_TABLE),
            event: event.clone(),
            user: user.clone(),
            rsvp_status,
            plus_one_count: 0,
            allergies: String::new(),
            notes: String::new(),
            dresscode_visible: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Scalar columns a participant may change on their own row.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ParticipationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsvp_status: Option<RsvpStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plus_one_count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dresscode_visible: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}
