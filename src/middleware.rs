use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{
    consts::table::USER_TABLE,
    errors::{Error, Result as RResult},
    models::user::CurrentUser,
    services::account::load_user,
    state::AppState,
    utils::{jwt::decode_jwt, record_id::record_id},
};

pub async fn auth_jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    let (mut parts, body) = request.into_parts();
    let user = check_auth_parts(&parts, &state)
        .await
        .map_err(IntoResponse::into_response)?;

    debug!(user = %user.id, "authenticated request");
    parts.extensions.insert(user);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

async fn check_auth_parts(parts: &Parts, state: &AppState) -> RResult<CurrentUser> {
    let header_value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?
        .to_str()
        .map_err(|_| Error::InvalidToken)?;

    let mut pieces = header_value.trim().splitn(2, ' ');
    let scheme = pieces.next().ok_or(Error::MissingToken)?;
    let token = pieces.next().map(str::trim).ok_or(Error::MissingToken)?;

    if !scheme.eq_ignore_ascii_case("Bearer") {
        warn!(scheme, "rejected authorization scheme");
        return Err(Error::InvalidScheme);
    }

    let claims = decode_jwt(token, &state.config.jwt_secret)
        .inspect_err(|err| warn!(reason = %err, "rejected bearer token"))?
        .claims;

    load_user(&state.sdb, record_id(USER_TABLE, &claims.id))
        .await?
        .ok_or_else(|| {
            warn!(user = %claims.id, "token for unknown account");
            Error::InvalidToken
        })
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> RResult<Self> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(Error::MissingToken)
    }
}
