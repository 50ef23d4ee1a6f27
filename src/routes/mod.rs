use axum::{Router, middleware};

use crate::{middleware::auth_jwt_middleware, state::AppState};

pub mod attachments;
pub mod auth;
pub mod comments;
pub mod events;
pub mod invitations;
pub mod participation;
pub mod polls;

/// Everything mounted under `/api`. Only registration and token issuance skip the JWT layer.
pub fn api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected())
        .merge(events::router())
        .merge(participation::router())
        .merge(invitations::router())
        .merge(polls::router())
        .merge(comments::router())
        .merge(attachments::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_jwt_middleware,
        ));

    Router::new()
        .merge(auth::unprotected())
        .merge(protected)
        .with_state(state)
}
