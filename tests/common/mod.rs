#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use hive_api::{
    config::{Config, FeatureFlags},
    db,
    models::{event::Event, user::CurrentUser},
    object_store::MemoryObjectStore,
    services::{
        account::{self, RegisterRequest},
        event::{self, CreateEventRequest},
    },
    state::AppState,
};
use surrealdb::{RecordId, engine::any};

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryObjectStore>,
}

/// Fresh in-memory database per call, with every feature enabled.
pub async fn context() -> TestContext {
    context_with(FeatureFlags::default()).await
}

pub async fn context_with(features: FeatureFlags) -> TestContext {
    let sdb = any::connect("mem://").await.expect("connect mem://");
    sdb.use_ns("test").use_db("test").await.expect("select ns/db");
    db::migrate(&sdb).await.expect("migrate");

    let config = Config {
        features,
        jwt_secret: "test-secret".to_string(),
        ..Config::default()
    };
    let store = Arc::new(MemoryObjectStore::new());
    let state = AppState::new(sdb, config, store.clone());
    TestContext { state, store }
}

pub async fn register(state: &AppState, username: &str) -> CurrentUser {
    let user = account::register(
        &state.sdb,
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "correct-horse-battery".to_string(),
        },
    )
    .await
    .expect("register user");
    CurrentUser::from(user)
}

pub fn event_request(title: &str) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        description: String::new(),
        location: "Community hall".to_string(),
        starts_at: Utc::now() + Duration::days(7),
        ends_at: None,
        dresscode: String::new(),
        metadata: serde_json::json!({}),
    }
}

pub async fn create_event(state: &AppState, owner: &CurrentUser, title: &str) -> Event {
    event::create(&state.sdb, owner, event_request(title))
        .await
        .expect("create event")
}

pub async fn count(state: &AppState, table: &str) -> usize {
    let rows: Vec<RecordId> = state
        .sdb
        .query("SELECT VALUE id FROM type::table($table);")
        .bind(("table", table.to_string()))
        .await
        .expect("count query")
        .take(0)
        .expect("take rows");
    rows.len()
}
