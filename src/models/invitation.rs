use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::{
    errors::{Error, Result},
    models::user::{CurrentUser, normalize_email},
    utils::record_id::{record_key, serialize_key, serialize_opt_key},
};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Invitation {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    #[serde(serialize_with = "serialize_key")]
    pub event: RecordId,
    #[serde(serialize_with = "serialize_opt_key")]
    pub invitee_user: Option<RecordId>,
    pub invitee_email: Option<String>, // ! lower-cased
    pub status: InvitationStatus,

    #[serde(skip_serializing)]
    pub token_hash: String, // ! unique, sha256 of the bearer token
    #[serde(skip_serializing, default)]
    pub invitee_user_key: String,
    #[serde(skip_serializing, default)]
    pub invitee_email_key: String,

    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "serialize_opt_key")]
    pub created_by: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CreateInvitation {
    pub id: RecordId,
    pub event: RecordId,
    pub invitee_user: Option<RecordId>,
    pub invitee_email: Option<String>,
    pub status: InvitationStatus,
    pub token_hash: String,
    pub invitee_user_key: String,
    pub invitee_email_key: String,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_by: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreateInvitation {
    /// Refuses an invitation without any target.
    pub fn new(
        id: RecordId,
        event: &RecordId,
        invitee_user: Option<RecordId>,
        invitee_email: Option<String>,
        token_hash: String,
        expires_at: DateTime<Utc>,
        created_by: &RecordId,
    ) -> Result<Self> {
        let invitee_email = invitee_email
            .map(|email| normalize_email(&email))
            .filter(|email| !email.is_empty());
        if invitee_user.is_none() && invitee_email.is_none() {
            return Err(Error::invalid(
                "invitee",
                "An invitation needs a user or an email address.",
            ));
        }
        let now = Utc::now();
        Ok(Self {
            invitee_user_key: invitee_user_key(event, &id, invitee_user.as_ref()),
            invitee_email_key: invitee_email_key(event, &id, invitee_email.as_deref()),
            id,
            event: event.clone(),
            invitee_user,
            invitee_email,
            status: InvitationStatus::Pending,
            token_hash,
            expires_at,
            responded_at: None,
            created_by: Some(created_by.clone()),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Uniqueness key for (event, invitee user). Rows without a user get a key private to the
/// row so they never collide.
pub fn invitee_user_key(event: &RecordId, invitation: &RecordId, user: Option<&RecordId>) -> String {
    match user {
        Some(user) => format!("{}|user|{}", record_key(event), record_key(user)),
        None => format!("{}|row|{}", record_key(event), record_key(invitation)),
    }
}

/// Uniqueness key for (event, lower(email)).
pub fn invitee_email_key(event: &RecordId, invitation: &RecordId, email: Option<&str>) -> String {
    match email {
        Some(email) => format!("{}|email|{}", record_key(event), normalize_email(email)),
        None => format!("{}|row|{}", record_key(event), record_key(invitation)),
    }
}

impl Invitation {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Accepted invitations always count; pending ones only until they expire.
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            InvitationStatus::Accepted => true,
            InvitationStatus::Pending => !self.is_expired_at(now),
            InvitationStatus::Declined => false,
        }
    }

    /// Whether this invitation names `user`, by account or by case-insensitive e-mail.
    pub fn targets(&self, user: &CurrentUser) -> bool {
        if self.invitee_user.as_ref() == Some(&user.id) {
            return true;
        }
        let email = user.normalized_email();
        match &self.invitee_email {
            Some(invited) => !email.is_empty() && normalize_email(invited) == email,
            None => false,
        }
    }

    /// Binding rules for answering: a user-bound invitation only to that account, an
    /// e-mail-bound one only to an account with the same address.
    pub fn ensure_responder(&self, user: &CurrentUser) -> Result<()> {
        if let Some(invitee) = &self.invitee_user {
            if invitee != &user.id {
                return Err(Error::forbidden(
                    "This invitation is not assigned to your account.",
                ));
            }
        }
        if let Some(invited) = &self.invitee_email {
            let invited = normalize_email(invited);
            if !invited.is_empty() && invited != user.normalized_email() {
                return Err(Error::forbidden(
                    "Invitation email does not match your account email.",
                ));
            }
        }
        Ok(())
    }
}
