use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    consts::table::{COMMENT_TABLE, EVENT_TABLE},
    errors::Result,
    models::{comment::Comment, user::CurrentUser},
    services::{
        comment::{self, CommentView, CreateCommentRequest, ReactionRequest, ReactionToggle},
        visibility,
    },
    state::AppState,
    utils::{record_id::record_id, validated_form::ValidatedJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/{comment_id}/reactions", post(toggle_reaction))
}

pub async fn list_comments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<CommentView>>> {
    state.require_feature(state.features().comments)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(
        comment::list(&state.sdb, &event.id, state.features().reactions).await?,
    ))
}

pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    state.require_feature(state.features().comments)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    let comment = comment::create(&state.sdb, &event.id, &user, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn toggle_reaction(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
    ValidatedJson(input): ValidatedJson<ReactionRequest>,
) -> Result<Response> {
    state.require_feature(state.features().reactions)?;
    let comment = comment::load_comment(&state.sdb, &record_id(COMMENT_TABLE, &comment_id)).await?;
    visibility::ensure_event_access(&state.sdb, &comment.event, &user).await?;

    let response = match comment::toggle_reaction(&state.sdb, &comment, &user, &input.emoji).await? {
        ReactionToggle::Added(reaction) => (StatusCode::CREATED, Json(reaction)).into_response(),
        ReactionToggle::Removed { emoji } => (
            StatusCode::OK,
            Json(json!({ "removed": true, "emoji": emoji })),
        )
            .into_response(),
    };
    Ok(response)
}
