use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};

use crate::{
    consts::table::EVENT_TABLE,
    errors::Result,
    models::{
        contribution::ContributionItem,
        custom_field::CustomFieldDefinition,
        user::CurrentUser,
    },
    services::{
        contribution::{self, CreateContributionRequest},
        custom_field::{self, CreateDefinitionRequest},
        participation::{self, ParticipantView, SelfUpdate},
        visibility,
    },
    state::AppState,
    utils::{record_id::record_id, validated_form::ValidatedJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/participants", get(list_participants))
        .route("/events/{event_id}/me", patch(update_me))
        .route(
            "/events/{event_id}/contributions",
            get(list_contributions).post(create_contribution),
        )
        .route(
            "/events/{event_id}/custom-fields",
            get(list_custom_fields).post(create_custom_field),
        )
}

pub async fn list_participants(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<ParticipantView>>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(participation::participants(&state.sdb, &event.id).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<SelfUpdate>,
) -> Result<Json<ParticipantView>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    let view = participation::update_self(&state.sdb, &event, &user, input).await?;
    Ok(Json(view))
}

pub async fn list_contributions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<ContributionItem>>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(contribution::list(&state.sdb, &event.id).await?))
}

pub async fn create_contribution(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateContributionRequest>,
) -> Result<(StatusCode, Json<ContributionItem>)> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    let item = contribution::create_one(&state.sdb, &event, &user, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_custom_fields(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<CustomFieldDefinition>>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(custom_field::list_definitions(&state.sdb, &event.id).await?))
}

pub async fn create_custom_field(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateDefinitionRequest>,
) -> Result<(StatusCode, Json<CustomFieldDefinition>)> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    let definition = custom_field::create_definition(&state.sdb, &event.id, input).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}
