use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    consts::table::{EVENT_TABLE, POLL_TABLE},
    errors::Result,
    models::user::CurrentUser,
    services::{
        poll::{self, CreatePollRequest, PollResults, PollView, VoteReceipt},
        visibility,
    },
    state::AppState,
    utils::{record_id::record_id, validated_form::ValidatedJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/polls", get(list_polls).post(create_poll))
        .route("/polls/{poll_id}/vote", post(vote))
        .route("/polls/{poll_id}/results", get(results))
}

#[derive(Deserialize, Debug, validator::Validate)]
pub struct VoteRequest {
    pub option_ids: Vec<String>,
}

pub async fn list_polls(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<PollView>>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(poll::list(&state.sdb, &event.id).await?))
}

pub async fn create_poll(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreatePollRequest>,
) -> Result<(StatusCode, Json<PollView>)> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    let view = poll::create(&state.sdb, &event, &user, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(poll_id): Path<String>,
    ValidatedJson(input): ValidatedJson<VoteRequest>,
) -> Result<Json<VoteReceipt>> {
    let poll = poll::load_poll(&state.sdb, &record_id(POLL_TABLE, &poll_id)).await?;
    let event = visibility::ensure_event_access(&state.sdb, &poll.event, &user).await?;
    let receipt = poll::cast_vote(&state.sdb, &event, &poll, &user, input.option_ids).await?;
    Ok(Json(receipt))
}

pub async fn results(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResults>> {
    let poll = poll::load_poll(&state.sdb, &record_id(POLL_TABLE, &poll_id)).await?;
    visibility::ensure_event_access(&state.sdb, &poll.event, &user).await?;
    Ok(Json(poll::results(&state.sdb, &poll).await?))
}
