use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use crate::{
    consts::table::CONTRIBUTION_TABLE,
    errors::{Error, Result},
    models::participation::Participation,
    utils::{
        record_id::{new_record_id, serialize_key},
        validator::validate_not_blank,
    },
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ContributionItem {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub participation: RecordId,
    pub item_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Validate)]
pub struct ContributionInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub item_name: String,
    #[validate(range(min = 1))]
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateContributionItem {
    pub id: RecordId,
    pub event: RecordId,
    pub participation: RecordId,
    pub item_name: String,
    pub quantity: u32,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl CreateContributionItem {
    /// The pledge is tied to the participation's own event.
    pub fn new(event: &RecordId, participation: &Participation, input: ContributionInput) -> Result<Self> {
        if &participation.event != event {
            return Err(Error::invalid(
                "participation",
                "Participation belongs to a different event.",
            ));
        }
        if input.quantity == 0 {
            return Err(Error::invalid("quantity", "Quantity must be greater than zero."));
        }
        Ok(Self {
            id: new_record_id(CONTRIBUTION_TABLE),
            event: event.clone(),
            participation: participation.id.clone(),
            item_name: input.item_name.trim().to_string(),
            quantity: input.quantity,
            notes: input.notes,
            created_at: Utc::now(),
        })
    }
}

fn default_quantity() -> u32 {
    1
}
