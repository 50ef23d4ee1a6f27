use axum::Router;

use crate::{routes::api_router, state::AppState};

pub mod config;
pub mod consts;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod object_store;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_router(state.clone()))
        .with_state(state)
}
