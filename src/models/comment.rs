use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    consts::table::{COMMENT_TABLE, REACTION_TABLE},
    errors::{Error, Result},
    utils::record_id::{new_record_id, serialize_key, serialize_opt_key},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Comment {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub author: RecordId,
    #[serde(serialize_with = "serialize_opt_key")]
    pub parent: Option<RecordId>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateComment {
    pub id: RecordId,
    pub event: RecordId,
    pub author: RecordId,
    pub parent: Option<RecordId>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreateComment {
    /// Replies stay on the parent's event and only one level deep.
    pub fn new(event: &RecordId, author: &RecordId, parent: Option<&Comment>, text: &str) -> Result<Self> {
        if let Some(parent) = parent {
            if &parent.event != event {
                return Err(Error::invalid(
                    "parent",
                    "Parent comment belongs to a different event.",
                ));
            }
            if parent.parent.is_some() {
                return Err(Error::invalid(
                    "parent",
                    "Nested replies beyond one level are not supported.",
                ));
            }
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid("text", "Comment text must not be blank."));
        }
        let now = Utc::now();
        Ok(Self {
            id: new_record_id(COMMENT_TABLE),
            event: event.clone(),
            author: author.clone(),
            parent: parent.map(|parent| parent.id.clone()),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Reaction {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub comment: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub user: RecordId,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateReaction {
    pub id: RecordId,
    pub comment: RecordId,
    pub user: RecordId,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl CreateReaction {
    pub fn new(comment: &RecordId, user: &RecordId, emoji: &str) -> Self {
        Self {
            id: new_record_id(REACTION_TABLE),
            comment: comment.clone(),
            user: user.clone(),
            emoji: emoji.to_string(),
            created_at: Utc::now(),
        }
    }
}

impl From<CreateReaction> for Reaction {
    fn from(row: CreateReaction) -> Self {
        Self {
            id: row.id,
            comment: row.comment,
            user: row.user,
            emoji: row.emoji,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(key: &str, event: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: RecordId::from_table_key("comments", key),
            event: RecordId::from_table_key("events", event),
            author: RecordId::from_table_key("users", "u1"),
            parent: parent.map(|p| RecordId::from_table_key("comments", p)),
            text: "hi".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reply_rules() {
        let event = RecordId::from_table_key("events", "e1");
        let author = RecordId::from_table_key("users", "u2");

        let top = comment("c1", "e1", None);
        let reply = CreateComment::new(&event, &author, Some(&top), "  me too ").unwrap();
        assert_eq!(reply.parent, Some(top.id.clone()));
        assert_eq!(reply.text, "me too");

        let nested = comment("c2", "e1", Some("c1"));
        assert!(CreateComment::new(&event, &author, Some(&nested), "deeper").is_err());

        let elsewhere = comment("c3", "e2", None);
        assert!(CreateComment::new(&event, &author, Some(&elsewhere), "wrong").is_err());

        assert!(CreateComment::new(&event, &author, None, "   ").is_err());
    }
}
