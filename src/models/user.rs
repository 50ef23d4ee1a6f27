use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::utils::record_id::serialize_key;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    pub username: String,
    pub email: String, // ! unique, stored lower-cased
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserWithPassword {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Public projection of an account embedded in other payloads.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UserSummary {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// The authenticated caller as seen by the core: opaque except for the e-mail address.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: RecordId,
    pub username: String,
    pub email: String,
}

impl CurrentUser {
    pub fn normalized_email(&self) -> String {
        normalize_email(&self.email)
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
