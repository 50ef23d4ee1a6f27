use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    consts::table::{POLL_OPTION_TABLE, POLL_TABLE, VOTE_SUBMISSION_TABLE, VOTE_TABLE},
    errors::{Error, Result},
    models::participation::Participation,
    utils::record_id::{new_record_id, serialize_key, serialize_opt_key},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Poll {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    pub question: String,
    #[serde(default)]
    pub allows_multiple: bool,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_opt_key")]
    pub created_by: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Poll {
    /// Either bound may be absent.
    pub fn ensure_open_at(&self, now: DateTime<Utc>) -> Result<()> {
        if let Some(opens_at) = self.opens_at {
            if now < opens_at {
                return Err(Error::invalid("poll", "Poll is not open yet."));
            }
        }
        if let Some(closes_at) = self.closes_at {
            if now > closes_at {
                return Err(Error::invalid("poll", "Poll is closed."));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct CreatePoll {
    pub id: RecordId,
    pub event: RecordId,
    pub question: String,
    pub allows_multiple: bool,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    pub created_by: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreatePoll {
    pub fn new(
        event: &RecordId,
        question: String,
        allows_multiple: bool,
        opens_at: Option<DateTime<Utc>>,
        closes_at: Option<DateTime<Utc>>,
        created_by: &RecordId,
    ) -> Result<Self> {
        if let (Some(opens_at), Some(closes_at)) = (opens_at, closes_at) {
            if closes_at < opens_at {
                return Err(Error::invalid(
                    "closes_at",
                    "Close time must not be before open time.",
                ));
            }
        }
        let now = Utc::now();
        Ok(Self {
            id: new_record_id(POLL_TABLE),
            event: event.clone(),
            question,
            allows_multiple,
            opens_at,
            closes_at,
            created_by: Some(created_by.clone()),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PollOption {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub poll: RecordId,
    pub label: String, // ! unique per poll
    #[serde(default)]
    pub position: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreatePollOption {
    pub id: RecordId,
    pub poll: RecordId,
    pub label: String,
    pub position: i64,
}

impl CreatePollOption {
    pub fn new(poll: &RecordId, label: String, position: i64) -> Self {
        Self {
            id: new_record_id(POLL_OPTION_TABLE),
            poll: poll.clone(),
            label,
            position,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Vote {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub poll: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub option: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub user: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub participation: RecordId,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateVote {
    pub id: RecordId,
    pub poll: RecordId,
    pub option: RecordId,
    pub user: RecordId,
    pub participation: RecordId,
    pub created_at: DateTime<Utc>,
}

impl CreateVote {
    /// The option must belong to the poll and the participation to the voter on the poll's
    /// event.
    pub fn new(
        poll: &Poll,
        option: &PollOption,
        participation: &Participation,
        user: &RecordId,
    ) -> Result<Self> {
        if option.poll != poll.id {
            return Err(Error::invalid("option_ids", "Invalid option for this poll."));
        }
        if participation.event != poll.event || &participation.user != user {
            return Err(Error::invalid(
                "participation",
                "Participation does not match this poll.",
            ));
        }
        Ok(Self {
            id: new_record_id(VOTE_TABLE),
            poll: poll.id.clone(),
            option: option.id.clone(),
            user: user.clone(),
            participation: participation.id.clone(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VoteSubmission {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub poll: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub user: RecordId,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateVoteSubmission {
    pub id: RecordId,
    pub poll: RecordId,
    pub user: RecordId,
    pub created_at: DateTime<Utc>,
}

impl CreateVoteSubmission {
    pub fn new(poll: &RecordId, user: &RecordId) -> Self {
        Self {
            id: new_record_id(VOTE_SUBMISSION_TABLE),
            poll: poll.clone(),
            user: user.clone(),
            created_at: Utc::now(),
        }
    }
}
