use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};

use crate::{
    consts::table::EVENT_TABLE,
    errors::Result,
    models::{event::Event, user::CurrentUser},
    services::{
        event::{self, CreateEventRequest, Page, PageParams, UpdateEventRequest},
        visibility,
    },
    state::AppState,
    utils::{record_id::record_id, validated_form::ValidatedJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{event_id}",
            get(read_event).patch(update_event).delete(delete_event),
        )
}

pub async fn list_events(
    State(state): State<AppState>,
    user: CurrentUser,
    params: std::result::Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<Event>>> {
    let Query(params) = params?;
    let page = event::list(&state.sdb, &user, params, state.config.page_size).await?;
    Ok(Json(page))
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = event::create(&state.sdb, &user, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn read_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Event>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(event))
}

pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateEventRequest>,
) -> Result<Json<Event>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    let event = event::update(&state.sdb, event, input).await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<StatusCode> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    event::delete(&state.sdb, &event).await?;
    Ok(StatusCode::NO_CONTENT)
}
