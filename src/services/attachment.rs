use bytes::Bytes;
use surrealdb::RecordId;
use tracing::info;

use crate::{
    consts::table::{DOCUMENT_TABLE, EVENT_IMAGE_TABLE},
    db::{self, Db},
    errors::{Error, Result},
    models::{
        attachment::{CreateDocument, CreateEventImage, Document, EventImage},
        user::CurrentUser,
    },
    object_store::{ObjectStore, file_extension, sanitize_file_name},
    utils::record_id::record_key,
};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

fn object_key(event: &RecordId, kind: &str, id: &RecordId, file_name: &str) -> String {
    format!(
        "events/{}/{kind}/{}_{}",
        record_key(event),
        record_key(id),
        sanitize_file_name(file_name)
    )
}

/// Stores the bytes first; the metadata row only references what is already stored.
pub async fn upload_document(
    sdb: &Db,
    store: &dyn ObjectStore,
    event_id: &RecordId,
    user: &CurrentUser,
    upload: Upload,
    title: Option<String>,
) -> Result<Document> {
    let id = CreateDocument::fresh_id();
    let key = object_key(event_id, "documents", &id, &upload.file_name);
    let size = upload.bytes.len();
    let reference = store.put(&key, upload.bytes).await?;

    let title = title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or(upload.file_name);
    let row = CreateDocument::new(id.clone(), event_id, &user.id, title, reference);
    db::insert(sdb, DOCUMENT_TABLE, row).await?;
    info!(event = %event_id, document = %id, size, "document uploaded");

    let document: Option<Document> = sdb.select(id).await?;
    document.ok_or(Error::InternalServerError)
}

pub async fn upload_image(
    sdb: &Db,
    store: &dyn ObjectStore,
    event_id: &RecordId,
    user: &CurrentUser,
    upload: Upload,
    caption: Option<String>,
) -> Result<EventImage> {
    let allowed = file_extension(&upload.file_name)
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
    if !allowed {
        return Err(Error::invalid(
            "image",
            format!("Unsupported image type. Allowed: {}.", IMAGE_EXTENSIONS.join(", ")),
        ));
    }

    let id = CreateEventImage::fresh_id();
    let key = object_key(event_id, "gallery", &id, &upload.file_name);
    let size = upload.bytes.len();
    let reference = store.put(&key, upload.bytes).await?;

    let caption = caption.map(|c| c.trim().to_string()).unwrap_or_default();
    let row = CreateEventImage::new(id.clone(), event_id, &user.id, caption, reference);
    db::insert(sdb, EVENT_IMAGE_TABLE, row).await?;
    info!(event = %event_id, image = %id, size, "gallery image uploaded");

    let image: Option<EventImage> = sdb.select(id).await?;
    image.ok_or(Error::InternalServerError)
}

pub async fn list_documents(sdb: &Db, event_id: &RecordId) -> Result<Vec<Document>> {
    let mut documents: Vec<Document> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", DOCUMENT_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(documents)
}

pub async fn list_images(sdb: &Db, event_id: &RecordId) -> Result<Vec<EventImage>> {
    let mut images: Vec<EventImage> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", EVENT_IMAGE_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(images)
}
