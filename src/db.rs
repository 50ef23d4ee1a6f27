use serde::Serialize;
use surrealdb::{
    RecordId, Response, Surreal,
    engine::any::{self, Any},
    method::Query,
    opt::auth::Root,
};
use tracing::info;

use crate::{
    config::Config,
    errors::{Error, Result},
};

pub type Db = Surreal<Any>;

/// Name carried by [`Error::Conflict`] when the storage layer aborts a transaction.
pub const TRANSACTION_CONFLICT: &str = "transaction";

/// Unique indexes backing every "exactly one" rule. Names match `consts::index`.
const SCHEMA: &str = r#"
DEFINE INDEX IF NOT EXISTS uniq_user_username ON TABLE users FIELDS username UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_user_email ON TABLE users FIELDS email UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_participation_event_user ON TABLE participations FIELDS event, user UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_invite_user_per_event ON TABLE invitations FIELDS invitee_user_key UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_invite_email_per_event ON TABLE invitations FIELDS invitee_email_key UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_invite_token_hash ON TABLE invitations FIELDS token_hash UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_custom_field_key_per_event ON TABLE custom_field_definitions FIELDS event, key UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_custom_field_answer_per_participant ON TABLE custom_field_values FIELDS definition, participation UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_poll_option_label ON TABLE poll_options FIELDS poll, label UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_vote_per_option_user ON TABLE votes FIELDS poll, user, option UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_vote_submission_per_user ON TABLE vote_submissions FIELDS poll, user UNIQUE;
DEFINE INDEX IF NOT EXISTS uniq_reaction_per_user_emoji ON TABLE reactions FIELDS comment, user, emoji UNIQUE;
"#;

pub async fn connect(config: &Config) -> Result<Db> {
    let sdb = any::connect(config.database_url.as_str()).await?;
    if let (Some(username), Some(password)) = (&config.database_user, &config.database_password)
    {
        sdb.signin(Root {
            username: username.as_str(),
            password: password.as_str(),
        })
        .await?;
    }
    sdb.use_ns(config.database_ns.as_str())
        .use_db(config.database_db.as_str())
        .await?;
    migrate(&sdb).await?;
    info!(endpoint = %config.database_url, "database ready");
    Ok(sdb)
}

pub async fn migrate(sdb: &Db) -> Result<()> {
    check(sdb.query(SCHEMA).await?)?;
    Ok(())
}

/// Opens a transaction block; chain statements with `.query(..)`/`.bind(..)` and finish
/// with [`commit`]. Statements are only sent on commit.
pub fn begin(sdb: &Db) -> Query<'_, Any> {
    sdb.query("BEGIN TRANSACTION;")
}

pub async fn commit(query: Query<'_, Any>) -> Result<Response> {
    let response = query.query("COMMIT TRANSACTION;").await?;
    check(response)
}

/// Single-statement insert of one row or an array of rows into `table`.
pub async fn insert<T>(sdb: &Db, table: &str, rows: T) -> Result<()>
where
    T: Serialize + 'static,
{
    let response = sdb
        .query(format!("INSERT INTO {table} $rows;"))
        .bind(("rows", rows))
        .await?;
    check(response)?;
    Ok(())
}

/// Surfaces statement errors carried inside a response. Unique index violations and
/// transaction conflicts become [`Error::Conflict`] so engines can map them to domain errors.
pub fn check(mut response: Response) -> Result<Response> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }
    let mut errors: Vec<(usize, surrealdb::Error)> = errors.into_iter().collect();
    errors.sort_by_key(|(idx, _)| *idx);

    for (_, err) in &errors {
        if let Some(conflict) = classify_conflict(&err.to_string()) {
            return Err(conflict);
        }
    }
    match errors.into_iter().next() {
        Some((_, err)) => Err(Error::SurrealError(err)),
        None => Ok(response),
    }
}

fn classify_conflict(message: &str) -> Option<Error> {
    if let Some(index) = violated_index(message) {
        return Some(Error::Conflict(index));
    }
    if message.contains("read or write conflict") || message.contains("Transaction conflict") {
        return Some(Error::Conflict(TRANSACTION_CONFLICT.to_string()));
    }
    None
}

/// Extracts the index name from "Database index `name` already contains ...".
fn violated_index(message: &str) -> Option<String> {
    if !message.contains("already contains") {
        return None;
    }
    let start = message.find("index `")? + "index `".len();
    let len = message[start..].find('`')?;
    Some(message[start..start + len].to_string())
}

/// True when `result` failed on the named unique index.
pub fn is_unique_violation<T>(result: &Result<T>, index: &str) -> bool {
    matches!(result, Err(Error::Conflict(name)) if name == index)
}

/// True when `result` lost an optimistic transaction against a concurrent writer.
pub fn is_transaction_conflict<T>(result: &Result<T>) -> bool {
    is_unique_violation(result, TRANSACTION_CONFLICT)
}

/// Ids of the rows in `table` whose `field` equals `parent`.
pub async fn ids_where(
    sdb: &Db,
    table: &'static str,
    field: &'static str,
    parent: &RecordId,
) -> Result<Vec<RecordId>> {
    let ids: Vec<RecordId> = sdb
        .query(format!("SELECT VALUE id FROM type::table($table) WHERE {field} = $parent;"))
        .bind(("table", table))
        .bind(("parent", parent.clone()))
        .await?
        .take(0)?;
    Ok(ids)
}
