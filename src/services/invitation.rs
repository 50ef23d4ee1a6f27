use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::{debug, info};
use validator::{Validate, ValidateEmail};

use crate::{
    consts::{
        index::UNIQ_PARTICIPATION,
        limits::MAX_INVITATION_TTL_HOURS,
        table::{INVITATION_TABLE, PARTICIPATION_TABLE, USER_TABLE},
    },
    db::{self, Db, is_transaction_conflict, is_unique_violation},
    errors::{Error, Result},
    models::{
        event::Event,
        invitation::{
            CreateInvitation, Invitation, InvitationStatus, invitee_email_key, invitee_user_key,
        },
        participation::{CreateParticipation, Participation, RsvpStatus},
        user::{CurrentUser, User, normalize_email},
    },
    services::visibility,
    utils::{
        record_id::{new_record_id, record_id},
        time::{time_now, time_now_plus_hours},
        token::{generate_invitation_token, hash_token},
    },
};

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct CreateInvitationsRequest {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    #[validate(range(min = 1, max = MAX_INVITATION_TTL_HOURS))]
    pub expires_in_hours: Option<i64>,
}

/// An invitation together with the only copy of its plaintext token.
#[derive(Serialize, Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
}

#[derive(Debug, Clone)]
struct Target {
    user: Option<User>,
    email: Option<String>,
}

/// Trimmed, lower-cased and de-duplicated addresses; malformed ones fail the batch.
fn normalize_emails(emails: &[String]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::new();
    for email in emails {
        let email = normalize_email(email);
        if email.is_empty() {
            continue;
        }
        if !email.validate_email() {
            return Err(Error::invalid("emails", format!("'{email}' is not a valid email address.")));
        }
        if !normalized.contains(&email) {
            normalized.push(email);
        }
    }
    Ok(normalized)
}

async fn find_by_key(sdb: &Db, field: &'static str, key: String) -> Result<Option<Invitation>> {
    let rows: Vec<Invitation> = sdb
        .query(format!(
            "SELECT * FROM type::table($table) WHERE {field} = $key LIMIT 1;"
        ))
        .bind(("table", INVITATION_TABLE))
        .bind(("key", key))
        .await?
        .take(0)?;
    Ok(rows.into_iter().next())
}

/// The row a target already owns, by account first, then by address.
async fn existing_for(sdb: &Db, event: &RecordId, target: &Target) -> Result<Option<Invitation>> {
    // the row id only matters for absent targets, which are never looked up here
    let unused = RecordId::from_table_key(INVITATION_TABLE, "none");
    if let Some(user) = &target.user {
        let key = invitee_user_key(event, &unused, Some(&user.id));
        if let Some(found) = find_by_key(sdb, "invitee_user_key", key).await? {
            return Ok(Some(found));
        }
    }
    match &target.email {
        Some(email) => {
            let key = invitee_email_key(event, &unused, Some(email));
            find_by_key(sdb, "invitee_email_key", key).await
        }
        None => Ok(None),
    }
}

impl Target {
    fn by_email(email: String) -> Self {
        Self {
            user: None,
            email: Some(email),
        }
    }

    /// Account targets carry the account's address so a later invite by e-mail finds the
    /// same row.
    fn by_user(user: User) -> Self {
        let email = Some(normalize_email(&user.email)).filter(|email| !email.is_empty());
        Self {
            user: Some(user),
            email,
        }
    }

    fn matches(&self, row: &CreateInvitation) -> bool {
        let same_user = matches!(
            (&self.user, &row.invitee_user),
            (Some(user), Some(invitee)) if &user.id == invitee
        );
        let same_email = matches!(
            (&self.email, &row.invitee_email),
            (Some(email), Some(invited)) if email == invited
        );
        same_user || same_email
    }
}

/// Issues one token per target. Re-inviting a target rewrites its existing row (fresh
/// token, expiry, PENDING) instead of adding a second one. The batch commits as a unit.
pub async fn create_invitations(
    sdb: &Db,
    event: &Event,
    created_by: &CurrentUser,
    input: CreateInvitationsRequest,
    default_ttl_hours: i64,
) -> Result<Vec<IssuedInvitation>> {
    let emails = normalize_emails(&input.emails)?;
    let user_ids: Vec<RecordId> = input
        .user_ids
        .iter()
        .map(|key| record_id(USER_TABLE, key))
        .collect();
    if emails.is_empty() && user_ids.is_empty() {
        return Err(Error::invalid(
            "emails",
            "Provide at least one email address or user id.",
        ));
    }
    let users: Vec<User> = if user_ids.is_empty() {
        Vec::new()
    } else {
        sdb.query("SELECT * FROM type::table($table) WHERE id IN $ids;")
            .bind(("table", USER_TABLE))
            .bind(("ids", user_ids.clone()))
            .await?
            .take(0)?
    };
    // unknown ids are skipped, the rest keep request order
    let mut targets: Vec<Target> = emails.into_iter().map(Target::by_email).collect();
    for id in &user_ids {
        if let Some(user) = users.iter().find(|user| &user.id == id) {
            targets.push(Target::by_user(user.clone()));
        }
    }
    if targets.is_empty() {
        return Err(Error::invalid("user_ids", "None of the given users exist."));
    }

    let ttl = input.expires_in_hours.unwrap_or(default_ttl_hours);
    let expires_at = time_now_plus_hours(ttl);

    let mut issued: Vec<(CreateInvitation, String)> = Vec::new();
    for target in targets {
        // a target may already own a row earlier in this batch or in storage
        let position = issued.iter().position(|(row, _)| target.matches(row));
        let earlier = position.map(|index| issued.remove(index).0);
        let existing = match &earlier {
            Some(_) => None,
            None => existing_for(sdb, &event.id, &target).await?,
        };
        let (token, token_hash) = generate_invitation_token();
        let (id, invitee_user, invitee_email, created_at, created_by_id) = match (&earlier, &existing) {
            (Some(row), _) => (
                row.id.clone(),
                target.user.as_ref().map(|u| u.id.clone()).or(row.invitee_user.clone()),
                target.email.clone().or(row.invitee_email.clone()),
                Some(row.created_at),
                row.created_by.clone(),
            ),
            (None, Some(found)) => (
                found.id.clone(),
                target.user.as_ref().map(|u| u.id.clone()).or(found.invitee_user.clone()),
                target.email.clone().or(found.invitee_email.clone()),
                Some(found.created_at),
                found.created_by.clone(),
            ),
            (None, None) => (
                new_record_id(INVITATION_TABLE),
                target.user.as_ref().map(|u| u.id.clone()),
                target.email.clone(),
                None,
                None,
            ),
        };
        let mut row = CreateInvitation::new(
            id,
            &event.id,
            invitee_user,
            invitee_email,
            token_hash,
            expires_at,
            &created_by.id,
        )?;
        if let Some(created_at) = created_at {
            row.created_at = created_at;
        }
        row.created_by = created_by_id.or(row.created_by);
        // the replaced entry's token is never handed out
        issued.retain(|(other, _)| other.id != row.id);
        issued.push((row, token));
    }

    let mut query = db::begin(sdb);
    for (i, (row, _)) in issued.iter().enumerate() {
        let (id_param, row_param) = (format!("invitation_{i}"), format!("invitation_row_{i}"));
        query = query
            .query(format!("UPSERT ${id_param} CONTENT ${row_param};"))
            .bind((id_param, row.id.clone()))
            .bind((row_param, row.clone()));
    }
    db::commit(query).await?;

    let ids: Vec<RecordId> = issued.iter().map(|(row, _)| row.id.clone()).collect();
    let stored: Vec<Invitation> = sdb
        .query("SELECT * FROM type::table($table) WHERE id IN $ids;")
        .bind(("table", INVITATION_TABLE))
        .bind(("ids", ids))
        .await?
        .take(0)?;

    let mut results = Vec::with_capacity(issued.len());
    for (row, token) in issued {
        let invitation = stored
            .iter()
            .find(|stored| stored.id == row.id)
            .cloned()
            .ok_or(Error::InternalServerError)?;
        results.push(IssuedInvitation { invitation, token });
    }
    info!(event = %event.id, count = results.len(), "invitations issued");
    Ok(results)
}

pub async fn list(sdb: &Db, event_id: &RecordId) -> Result<Vec<Invitation>> {
    let mut rows: Vec<Invitation> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", INVITATION_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(rows)
}

#[derive(Serialize, Debug, Clone)]
pub struct InvitationResponse {
    pub invitation: Invitation,
    pub participation: Participation,
}

#[derive(Serialize, Debug, Clone)]
struct InvitationDecision {
    status: InvitationStatus,
    responded_at: chrono::DateTime<chrono::Utc>,
    invitee_user: RecordId,
    invitee_user_key: String,
    updated_at: chrono::DateTime<chrono::Utc>,
}

/// Redeems a token. The invitation decision and the responder's participation commit
/// together. Answering again with an unexpired token is accepted.
pub async fn respond(
    sdb: &Db,
    token: &str,
    user: &CurrentUser,
    status: InvitationStatus,
) -> Result<InvitationResponse> {
    let rsvp = match status {
        InvitationStatus::Accepted => RsvpStatus::Accepted,
        InvitationStatus::Declined => RsvpStatus::Declined,
        InvitationStatus::Pending => {
            return Err(Error::invalid("status", "Choose 'accepted' or 'declined'."));
        }
    };

    let invitation = find_by_token(sdb, token).await?;
    let now = time_now();
    if invitation.is_expired_at(now) {
        return Err(Error::invalid("token", "Invitation has expired."));
    }
    invitation.ensure_responder(user)?;
    let event = visibility::load_event(sdb, &invitation.event).await?;

    let decision = InvitationDecision {
        status,
        responded_at: now,
        invitee_user: user.id.clone(),
        invitee_user_key: invitee_user_key(&event.id, &invitation.id, Some(&user.id)),
        updated_at: now,
    };

    // one retry covers a participation row created concurrently between read and commit
    let mut attempt = 0;
    let participation = loop {
        attempt += 1;
        let existing = visibility::find_participation(sdb, &event.id, &user.id).await?;
        let query = db::begin(sdb)
            .query("UPDATE $invitation MERGE $decision;")
            .bind(("invitation", invitation.id.clone()))
            .bind(("decision", decision.clone()));
        let query = match &existing {
            Some(participation) => query
                .query("UPDATE $participation SET rsvp_status = $rsvp, updated_at = $now;")
                .bind(("participation", participation.id.clone()))
                .bind(("rsvp", rsvp))
                .bind(("now", now)),
            None => query
                .query(format!("INSERT INTO {PARTICIPATION_TABLE} $participation_row;"))
                .bind((
                    "participation_row",
                    CreateParticipation::new(&event.id, &user.id, rsvp),
                )),
        };
        let result = db::commit(query).await;
        let lost_race =
            is_unique_violation(&result, UNIQ_PARTICIPATION) || is_transaction_conflict(&result);
        if attempt == 1 && lost_race {
            debug!(invitation = %invitation.id, "participation appeared concurrently, retrying");
            continue;
        }
        result?;
        break visibility::find_participation(sdb, &event.id, &user.id)
            .await?
            .ok_or(Error::InternalServerError)?;
    };

    let invitation: Option<Invitation> = sdb.select(invitation.id.clone()).await?;
    let invitation = invitation.ok_or(Error::InternalServerError)?;
    info!(
        invitation = %invitation.id,
        event = %event.id,
        user = %user.id,
        status = ?invitation.status,
        "invitation answered"
    );
    Ok(InvitationResponse {
        invitation,
        participation,
    })
}

async fn find_by_token(sdb: &Db, token: &str) -> Result<Invitation> {
    let rows: Vec<Invitation> = sdb
        .query("SELECT * FROM type::table($table) WHERE token_hash = $hash LIMIT 1;")
        .bind(("table", INVITATION_TABLE))
        .bind(("hash", hash_token(token.trim())))
        .await?
        .take(0)?;
    rows.into_iter().next().ok_or(Error::NotFound("Invitation"))
}
