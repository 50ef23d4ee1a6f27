use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    errors::Result,
    models::user::{CurrentUser, User},
    services::account::{self, RegisterRequest, TokenRequest, TokenResponse},
    state::AppState,
    utils::{record_id::record_key, validated_form::ValidatedJson},
};

pub fn unprotected() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(token))
}

pub fn protected() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = account::register(&state.sdb, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn token(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let token = account::issue_token(&state.sdb, &state.config, input).await?;
    Ok(Json(token))
}

pub async fn me(user: CurrentUser) -> Json<Value> {
    Json(json!({
        "id": record_key(&user.id),
        "username": user.username,
        "email": user.email,
    }))
}
