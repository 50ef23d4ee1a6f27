use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    consts::{
        limits::MAX_PAGE_SIZE,
        table::{
            COMMENT_TABLE, CONTRIBUTION_TABLE, CUSTOM_FIELD_DEFINITION_TABLE,
            CUSTOM_FIELD_VALUE_TABLE, DOCUMENT_TABLE, EVENT_IMAGE_TABLE, EVENT_TABLE,
            INVITATION_TABLE, PARTICIPATION_TABLE, POLL_OPTION_TABLE, POLL_TABLE, REACTION_TABLE,
            VOTE_SUBMISSION_TABLE, VOTE_TABLE,
        },
    },
    db::{self, Db},
    errors::{Error, Result},
    models::{
        event::{CreateEvent, Event, UpdateEvent, empty_object, validate_time_window},
        participation::{CreateParticipation, RsvpStatus},
        user::CurrentUser,
    },
    services::visibility,
    utils::{
        record_id::new_record_id,
        time::time_now,
        patch::present,
        validator::{validate_metadata, validate_not_blank},
    },
};

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CreateEventRequest {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub dresscode: String,
    #[serde(default = "empty_object")]
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: serde_json::Value,
}

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateEventRequest {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    /// Absent keeps the current end, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
    #[validate(length(max = 255))]
    pub dresscode: Option<String>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<serde_json::Value>,
}

/// Creates the event and the owner's ACCEPTED participation together.
pub async fn create(sdb: &Db, owner: &CurrentUser, input: CreateEventRequest) -> Result<Event> {
    validate_time_window(input.starts_at, input.ends_at)?;

    let now = time_now();
    let row = CreateEvent {
        id: new_record_id(EVENT_TABLE),
        owner: owner.id.clone(),
        title: input.title,
        description: input.description,
        location: input.location.trim().to_string(),
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        dresscode: input.dresscode,
        metadata: input.metadata,
        created_at: now,
        updated_at: now,
    };
    let id = row.id.clone();
    let participation = CreateParticipation::new(&id, &owner.id, RsvpStatus::Accepted);

    let query = db::begin(sdb)
        .query(format!("INSERT INTO {EVENT_TABLE} $event_row;"))
        .bind(("event_row", row))
        .query(format!("INSERT INTO {PARTICIPATION_TABLE} $owner_participation;"))
        .bind(("owner_participation", participation));
    db::commit(query).await?;

    info!(event = %id, owner = %owner.id, "event created");
    visibility::load_event(sdb, &id).await
}

/// Owner-only. The time window is checked against the merged result.
pub async fn update(sdb: &Db, event: Event, input: UpdateEventRequest) -> Result<Event> {
    let starts_at = input.starts_at.unwrap_or(event.starts_at);
    let ends_at = input.ends_at.unwrap_or(event.ends_at);
    validate_time_window(starts_at, ends_at)?;

    let patch = UpdateEvent {
        title: input.title.unwrap_or(event.title),
        description: input.description.unwrap_or(event.description),
        location: input
            .location
            .map(|location| location.trim().to_string())
            .unwrap_or(event.location),
        starts_at,
        ends_at,
        dresscode: input.dresscode.unwrap_or(event.dresscode),
        metadata: input.metadata.unwrap_or(event.metadata),
        updated_at: time_now(),
    };
    let updated: Option<Event> = sdb.update(event.id.clone()).merge(patch).await?;
    updated.ok_or(Error::NotFound("Event"))
}

/// Removes the event and every row hanging off it in one transaction.
///
/// Grandchildren are deleted per parent, so every statement filters on a plain field.
pub async fn delete(sdb: &Db, event: &Event) -> Result<()> {
    let polls = db::ids_where(sdb, POLL_TABLE, "event", &event.id).await?;
    let comments = db::ids_where(sdb, COMMENT_TABLE, "event", &event.id).await?;
    let definitions = db::ids_where(sdb, CUSTOM_FIELD_DEFINITION_TABLE, "event", &event.id).await?;

    let mut query = db::begin(sdb);
    for (i, poll) in polls.into_iter().enumerate() {
        let param = format!("cascade_poll_{i}");
        query = query
            .query(format!(
                "DELETE {VOTE_TABLE} WHERE poll = ${param}; \
                 DELETE {VOTE_SUBMISSION_TABLE} WHERE poll = ${param}; \
                 DELETE {POLL_OPTION_TABLE} WHERE poll = ${param};"
            ))
            .bind((param, poll));
    }
    for (i, comment) in comments.into_iter().enumerate() {
        let param = format!("cascade_comment_{i}");
        query = query
            .query(format!("DELETE {REACTION_TABLE} WHERE comment = ${param};"))
            .bind((param, comment));
    }
    for (i, definition) in definitions.into_iter().enumerate() {
        let param = format!("cascade_definition_{i}");
        query = query
            .query(format!("DELETE {CUSTOM_FIELD_VALUE_TABLE} WHERE definition = ${param};"))
            .bind((param, definition));
    }
    for table in [
        POLL_TABLE,
        COMMENT_TABLE,
        CUSTOM_FIELD_DEFINITION_TABLE,
        CONTRIBUTION_TABLE,
        INVITATION_TABLE,
        DOCUMENT_TABLE,
        EVENT_IMAGE_TABLE,
        PARTICIPATION_TABLE,
    ] {
        query = query.query(format!("DELETE {table} WHERE event = $cascade_event;"));
    }
    let query = query
        .query("DELETE $cascade_event;")
        .bind(("cascade_event", event.id.clone()));
    db::commit(query).await?;
    info!(event = %event.id, "event deleted");
    Ok(())
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PageParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Serialize, Debug, Clone)]
pub struct Page<T> {
    pub count: usize,
    pub page: usize,
    pub results: Vec<T>,
}

/// Events visible to `user`, soonest first, newest first among equal start times.
pub async fn list(
    sdb: &Db,
    user: &CurrentUser,
    params: PageParams,
    default_page_size: usize,
) -> Result<Page<Event>> {
    let page = params.page.unwrap_or(1);
    if page == 0 {
        return Err(Error::invalid("page", "Page numbers start at 1."));
    }
    let page_size = params
        .page_size
        .unwrap_or(default_page_size)
        .clamp(1, MAX_PAGE_SIZE);

    let mut events = visibility::visible_events(sdb, user).await?;
    events.sort_by(|a, b| {
        a.starts_at
            .cmp(&b.starts_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    let count = events.len();
    let offset = match (page - 1).checked_mul(page_size) {
        Some(offset) if page == 1 || offset < count => offset,
        _ => return Err(Error::NotFound("Page")),
    };
    let results = events.into_iter().skip(offset).take(page_size).collect();
    Ok(Page {
        count,
        page,
        results,
    })
}
