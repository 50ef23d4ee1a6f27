use surrealdb::RecordId;

use crate::{
    consts::table::{EVENT_TABLE, INVITATION_TABLE, PARTICIPATION_TABLE},
    db::Db,
    errors::{Error, Result},
    models::{event::Event, invitation::Invitation, participation::Participation, user::CurrentUser},
    utils::time::time_now,
};

pub async fn load_event(sdb: &Db, event_id: &RecordId) -> Result<Event> {
    let event: Option<Event> = sdb.select(event_id.clone()).await?;
    event.ok_or(Error::NotFound("Event"))
}

pub async fn find_participation(
    sdb: &Db,
    event_id: &RecordId,
    user_id: &RecordId,
) -> Result<Option<Participation>> {
    let rows: Vec<Participation> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event AND user = $user LIMIT 1;")
        .bind(("table", PARTICIPATION_TABLE))
        .bind(("event", event_id.clone()))
        .bind(("user", user_id.clone()))
        .await?
        .take(0)?;
    Ok(rows.into_iter().next())
}

/// Invitations naming `user` by account or by e-mail, optionally restricted to one event.
pub async fn invitations_for(
    sdb: &Db,
    event_id: Option<&RecordId>,
    user: &CurrentUser,
) -> Result<Vec<Invitation>> {
    let email = user.normalized_email();
    let filter = match event_id {
        Some(_) => "AND event = $event",
        None => "",
    };
    let query = format!(
        "SELECT * FROM type::table($table) WHERE (invitee_user = $user OR (invitee_email != NONE AND invitee_email = $email)) {filter};"
    );
    let mut query = sdb
        .query(query)
        .bind(("table", INVITATION_TABLE))
        .bind(("user", user.id.clone()))
        .bind(("email", email));
    if let Some(event_id) = event_id {
        query = query.bind(("event", event_id.clone()));
    }
    let rows: Vec<Invitation> = query.await?.take(0)?;
    // email match is re-checked in Rust so an account without an address never matches
    Ok(rows.into_iter().filter(|inv| inv.targets(user)).collect())
}

/// An accepted invitation, or a pending one that has not expired.
pub async fn has_valid_invitation(sdb: &Db, event_id: &RecordId, user: &CurrentUser) -> Result<bool> {
    let now = time_now();
    Ok(invitations_for(sdb, Some(event_id), user)
        .await?
        .iter()
        .any(|inv| inv.grants_access_at(now)))
}

pub fn can_manage(event: &Event, user: &CurrentUser) -> bool {
    event.is_owned_by(&user.id)
}

/// Evaluated fresh on every call: owner, any participation, or a live invitation.
pub async fn can_access(sdb: &Db, event: &Event, user: &CurrentUser) -> Result<bool> {
    if can_manage(event, user) {
        return Ok(true);
    }
    if find_participation(sdb, &event.id, &user.id).await?.is_some() {
        return Ok(true);
    }
    has_valid_invitation(sdb, &event.id, user).await
}

pub async fn ensure_event_access(sdb: &Db, event_id: &RecordId, user: &CurrentUser) -> Result<Event> {
    let event = load_event(sdb, event_id).await?;
    if !can_access(sdb, &event, user).await? {
        return Err(Error::forbidden("You do not have access to this event."));
    }
    Ok(event)
}

pub async fn ensure_event_owner(sdb: &Db, event_id: &RecordId, user: &CurrentUser) -> Result<Event> {
    let event = load_event(sdb, event_id).await?;
    if !can_manage(&event, user) {
        return Err(Error::forbidden("Only the event owner can do this."));
    }
    Ok(event)
}

/// Every event `user` may read.
pub async fn visible_events(sdb: &Db, user: &CurrentUser) -> Result<Vec<Event>> {
    let mut response = sdb
        .query("SELECT VALUE id FROM type::table($events) WHERE owner = $user;")
        .query("SELECT VALUE event FROM type::table($participations) WHERE user = $user;")
        .bind(("events", EVENT_TABLE))
        .bind(("participations", PARTICIPATION_TABLE))
        .bind(("user", user.id.clone()))
        .await?;
    let owned: Vec<RecordId> = response.take(0)?;
    let joined: Vec<RecordId> = response.take(1)?;

    let now = time_now();
    let invited = invitations_for(sdb, None, user)
        .await?
        .into_iter()
        .filter(|inv| inv.grants_access_at(now))
        .map(|inv| inv.event);

    let mut ids: Vec<RecordId> = Vec::new();
    for id in owned.into_iter().chain(joined).chain(invited) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let events: Vec<Event> = sdb
        .query("SELECT * FROM type::table($table) WHERE id IN $ids;")
        .bind(("table", EVENT_TABLE))
        .bind(("ids", ids))
        .await?
        .take(0)?;
    Ok(events)
}

