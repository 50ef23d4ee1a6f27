use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    consts::table::EVENT_TABLE,
    errors::Result,
    models::{
        invitation::{Invitation, InvitationStatus},
        user::CurrentUser,
    },
    services::{
        invitation::{self, CreateInvitationsRequest, InvitationResponse, IssuedInvitation},
        visibility,
    },
    state::AppState,
    utils::{record_id::record_id, validated_form::ValidatedJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/invites",
            get(list_invitations).post(create_invitations),
        )
        .route("/invites/{token}/respond", post(respond_to_invitation))
}

#[derive(Serialize, Debug)]
pub struct IssuedInvitations {
    pub results: Vec<IssuedInvitation>,
}

#[derive(Deserialize, Debug, validator::Validate)]
pub struct RespondRequest {
    pub status: InvitationStatus,
}

pub async fn create_invitations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateInvitationsRequest>,
) -> Result<(StatusCode, Json<IssuedInvitations>)> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    let results = invitation::create_invitations(
        &state.sdb,
        &event,
        &user,
        input,
        state.config.invitation_ttl_hours,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(IssuedInvitations { results })))
}

pub async fn list_invitations(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Invitation>>> {
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_owner(&state.sdb, &event_id, &user).await?;
    Ok(Json(invitation::list(&state.sdb, &event.id).await?))
}

pub async fn respond_to_invitation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(token): Path<String>,
    ValidatedJson(input): ValidatedJson<RespondRequest>,
) -> Result<Json<InvitationResponse>> {
    let response = invitation::respond(&state.sdb, &token, &user, input.status).await?;
    Ok(Json(response))
}
