use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    routing::get,
};

use crate::{
    consts::table::EVENT_TABLE,
    errors::{Error, Result},
    models::{
        attachment::{Document, EventImage},
        user::CurrentUser,
    },
    services::{
        attachment::{self, Upload},
        visibility,
    },
    state::AppState,
    utils::record_id::record_id,
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/events/{event_id}/documents",
            get(list_documents).post(upload_document),
        )
        .route(
            "/events/{event_id}/gallery",
            get(list_gallery).post(upload_image),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// The file part named `file_field` plus an optional text part named `text_field`.
async fn read_upload(
    mut multipart: Multipart,
    file_field: &'static str,
    text_field: &str,
) -> Result<(Upload, Option<String>)> {
    let mut upload = None;
    let mut text = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field.file_name().unwrap_or(file_field).to_string();
            let bytes = field.bytes().await?;
            upload = Some(Upload { file_name, bytes });
        } else if name == text_field {
            text = Some(field.text().await?);
        }
    }
    let upload = upload.ok_or_else(|| Error::invalid(file_field, "No file was submitted."))?;
    if upload.bytes.is_empty() {
        return Err(Error::invalid(file_field, "The submitted file is empty."));
    }
    Ok((upload, text))
}

pub async fn list_documents(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Document>>> {
    state.require_feature(state.features().documents)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(attachment::list_documents(&state.sdb, &event.id).await?))
}

pub async fn upload_document(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Document>)> {
    state.require_feature(state.features().documents)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    let (upload, title) = read_upload(multipart?, "file", "title").await?;
    let document = attachment::upload_document(
        &state.sdb,
        state.store.as_ref(),
        &event.id,
        &user,
        upload,
        title,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_gallery(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<EventImage>>> {
    state.require_feature(state.features().gallery)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    Ok(Json(attachment::list_images(&state.sdb, &event.id).await?))
}

pub async fn upload_image(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<EventImage>)> {
    state.require_feature(state.features().gallery)?;
    let event_id = record_id(EVENT_TABLE, &event_id);
    let event = visibility::ensure_event_access(&state.sdb, &event_id, &user).await?;
    let (upload, caption) = read_upload(multipart?, "image", "caption").await?;
    let image = attachment::upload_image(
        &state.sdb,
        state.store.as_ref(),
        &event.id,
        &user,
        upload,
        caption,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(image)))
}
