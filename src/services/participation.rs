use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use surrealdb::RecordId;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    consts::{
        index::UNIQ_PARTICIPATION,
        table::{PARTICIPATION_TABLE, USER_TABLE},
    },
    db::{self, Db, is_transaction_conflict, is_unique_violation},
    errors::{Error, Result},
    models::{
        contribution::{ContributionInput, ContributionItem, CreateContributionItem},
        custom_field::CustomFieldType,
        event::Event,
        participation::{CreateParticipation, Participation, ParticipationChanges, RsvpStatus},
        user::{CurrentUser, User, UserSummary},
    },
    services::{contribution, custom_field, visibility},
    utils::time::time_now,
};

/// Tries before a lost first-touch race is reported to the caller.
const FIRST_TOUCH_ATTEMPTS: usize = 3;

/// The single path by which a participation row comes into existence.
///
/// Owners always end up ACCEPTED. Anyone else keeps an existing row untouched, or needs a
/// live invitation to get a fresh PENDING one. Concurrent first touches race on the
/// `(event, user)` unique index or abort as a transaction conflict; the loser re-reads the
/// winner's row, inserting again only if no row is there yet.
pub async fn resolve_or_create(sdb: &Db, event: &Event, user: &CurrentUser) -> Result<Participation> {
    let is_owner = visibility::can_manage(event, user);

    let mut attempt = 0;
    loop {
        attempt += 1;
        if let Some(existing) = visibility::find_participation(sdb, &event.id, &user.id).await? {
            if is_owner && existing.rsvp_status != RsvpStatus::Accepted {
                return accept_owner(sdb, existing).await;
            }
            return Ok(existing);
        }

        let status = if is_owner {
            RsvpStatus::Accepted
        } else {
            if !visibility::has_valid_invitation(sdb, &event.id, user).await? {
                return Err(Error::forbidden("You are not invited to this event."));
            }
            RsvpStatus::Pending
        };

        let row = CreateParticipation::new(&event.id, &user.id, status);
        let result = db::insert(sdb, PARTICIPATION_TABLE, row).await;
        let lost_race =
            is_unique_violation(&result, UNIQ_PARTICIPATION) || is_transaction_conflict(&result);
        if lost_race && attempt < FIRST_TOUCH_ATTEMPTS {
            debug!(event = %event.id, user = %user.id, attempt, "participation created concurrently, re-reading");
            continue;
        }
        result?;

        return visibility::find_participation(sdb, &event.id, &user.id)
            .await?
            .ok_or(Error::InternalServerError);
    }
}

async fn accept_owner(sdb: &Db, participation: Participation) -> Result<Participation> {
    let updated: Option<Participation> = sdb
        .query("UPDATE $participation SET rsvp_status = $status, updated_at = $now RETURN AFTER;")
        .bind(("participation", participation.id.clone()))
        .bind(("status", RsvpStatus::Accepted))
        .bind(("now", time_now()))
        .await?
        .take(0)?;
    updated.ok_or(Error::InternalServerError)
}

pub async fn list_for_event(sdb: &Db, event_id: &RecordId) -> Result<Vec<Participation>> {
    let mut rows: Vec<Participation> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", PARTICIPATION_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(rows)
}

#[derive(Serialize, Debug, Clone)]
pub struct AnswerView {
    pub key: String,
    pub field_type: CustomFieldType,
    pub value: Value,
}

#[derive(Serialize, Debug, Clone)]
pub struct ParticipantView {
    #[serde(flatten)]
    pub participation: Participation,
    pub user: Option<UserSummary>,
    pub contributions: Vec<ContributionItem>,
    pub custom_fields: Vec<AnswerView>,
}

/// Participations of an event with their account, pledges and answers.
pub async fn participants(sdb: &Db, event_id: &RecordId) -> Result<Vec<ParticipantView>> {
    let participations = list_for_event(sdb, event_id).await?;
    let user_ids: Vec<RecordId> = participations.iter().map(|p| p.user.clone()).collect();
    let users: Vec<User> = sdb
        .query("SELECT * FROM type::table($table) WHERE id IN $ids;")
        .bind(("table", USER_TABLE))
        .bind(("ids", user_ids))
        .await?
        .take(0)?;
    let contributions = contribution::list(sdb, event_id).await?;
    let definitions = custom_field::list_definitions(sdb, event_id).await?;
    let participation_ids: Vec<RecordId> = participations.iter().map(|p| p.id.clone()).collect();
    let values = custom_field::list_values(sdb, participation_ids).await?;

    let definitions: HashMap<String, _> = definitions
        .into_iter()
        .map(|definition| (definition.id.to_string(), definition))
        .collect();

    let views = participations
        .into_iter()
        .map(|participation| {
            let user = users
                .iter()
                .find(|user| user.id == participation.user)
                .map(UserSummary::from);
            let contributions = contributions
                .iter()
                .filter(|item| item.participation == participation.id)
                .cloned()
                .collect();
            let custom_fields = values
                .iter()
                .filter(|value| value.participation == participation.id)
                .filter_map(|value| {
                    let definition = definitions.get(&value.definition.to_string())?;
                    Some(AnswerView {
                        key: definition.key.clone(),
                        field_type: definition.field_type,
                        value: value.value.as_ref().map(|v| v.to_json()).unwrap_or(Value::Null),
                    })
                })
                .collect();
            ParticipantView {
                participation,
                user,
                contributions,
                custom_fields,
            }
        })
        .collect();
    Ok(views)
}

pub async fn participant(sdb: &Db, participation: &Participation) -> Result<ParticipantView> {
    participants(sdb, &participation.event)
        .await?
        .into_iter()
        .find(|view| view.participation.id == participation.id)
        .ok_or(Error::NotFound("Participation"))
}

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct SelfUpdate {
    pub rsvp_status: Option<RsvpStatus>,
    #[validate(range(max = 1000))]
    pub plus_one_count: Option<u16>,
    #[validate(length(max = 500))]
    pub allergies: Option<String>,
    pub notes: Option<String>,
    pub dresscode_visible: Option<bool>,
    /// Replaces every pledge of the caller when present.
    #[validate(nested)]
    pub contributions: Option<Vec<ContributionInput>>,
    pub custom_fields: Option<HashMap<String, Value>>,
}

/// Applies scalar changes, the pledge list and custom-field answers in one transaction.
/// Everything is validated before the first write.
pub async fn update_self(
    sdb: &Db,
    event: &Event,
    user: &CurrentUser,
    input: SelfUpdate,
) -> Result<ParticipantView> {
    let participation = resolve_or_create(sdb, event, user).await?;

    let contributions = match input.contributions {
        Some(items) => Some(
            items
                .into_iter()
                .map(|item| CreateContributionItem::new(&event.id, &participation, item))
                .collect::<Result<Vec<_>>>()?,
        ),
        None => None,
    };
    let answers = match &input.custom_fields {
        Some(answers) => Some(custom_field::prepare_answers(sdb, &participation, answers).await?),
        None => None,
    };

    let changes = ParticipationChanges {
        rsvp_status: input.rsvp_status,
        plus_one_count: input.plus_one_count,
        allergies: input.allergies,
        notes: input.notes,
        dresscode_visible: input.dresscode_visible,
        updated_at: time_now(),
    };

    let mut query = db::begin(sdb)
        .query("UPDATE $participation MERGE $changes;")
        .bind(("participation", participation.id.clone()))
        .bind(("changes", changes));
    if let Some(rows) = contributions {
        query = contribution::replace_statements(query, &participation.id, rows);
    }
    if let Some(answers) = answers {
        query = custom_field::answer_statements(query, answers);
    }
    db::commit(query).await?;

    info!(event = %event.id, participation = %participation.id, "participation updated");
    let refreshed = visibility::find_participation(sdb, &event.id, &user.id)
        .await?
        .ok_or(Error::NotFound("Participation"))?;
    participant(sdb, &refreshed).await
}
