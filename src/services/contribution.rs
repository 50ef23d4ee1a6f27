use serde::Deserialize;
use surrealdb::{RecordId, engine::any::Any, method::Query};
use tracing::info;
use validator::Validate;

use crate::{
    consts::table::{CONTRIBUTION_TABLE, PARTICIPATION_TABLE},
    db::{self, Db},
    errors::{Error, Result},
    models::{
        contribution::{ContributionInput, ContributionItem, CreateContributionItem},
        event::Event,
        participation::Participation,
        user::CurrentUser,
    },
    services::{participation, visibility},
    utils::record_id::record_id,
};

pub async fn list(sdb: &Db, event_id: &RecordId) -> Result<Vec<ContributionItem>> {
    let mut items: Vec<ContributionItem> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", CONTRIBUTION_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(items)
}

/// Appends "drop every pledge of `participation`, insert `rows`" to an open transaction.
pub fn replace_statements<'a>(
    query: Query<'a, Any>,
    participation: &RecordId,
    rows: Vec<CreateContributionItem>,
) -> Query<'a, Any> {
    let query = query
        .query(format!(
            "DELETE {CONTRIBUTION_TABLE} WHERE participation = $contribution_owner;"
        ))
        .bind(("contribution_owner", participation.clone()));
    if rows.is_empty() {
        return query;
    }
    query
        .query(format!("INSERT INTO {CONTRIBUTION_TABLE} $contribution_rows;"))
        .bind(("contribution_rows", rows))
}

/// Last write wins: prior pledges of the participation are replaced wholesale.
pub async fn replace(
    sdb: &Db,
    event_id: &RecordId,
    participation: &Participation,
    items: Vec<ContributionInput>,
) -> Result<Vec<ContributionItem>> {
    let rows = items
        .into_iter()
        .map(|item| CreateContributionItem::new(event_id, participation, item))
        .collect::<Result<Vec<_>>>()?;
    let count = rows.len();
    db::commit(replace_statements(db::begin(sdb), &participation.id, rows)).await?;
    info!(participation = %participation.id, count, "contributions replaced");

    Ok(list(sdb, event_id)
        .await?
        .into_iter()
        .filter(|item| item.participation == participation.id)
        .collect())
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CreateContributionRequest {
    /// Target participation key; defaults to the caller's own.
    pub participation: Option<String>,
    #[serde(flatten)]
    #[validate(nested)]
    pub item: ContributionInput,
}

/// Adds one pledge. Only the owner may pledge on behalf of another participant.
pub async fn create_one(
    sdb: &Db,
    event: &Event,
    user: &CurrentUser,
    input: CreateContributionRequest,
) -> Result<ContributionItem> {
    let target = match input.participation {
        Some(key) => {
            let id = record_id(PARTICIPATION_TABLE, &key);
            let target: Option<Participation> = sdb.select(id).await?;
            let target = target.ok_or_else(|| {
                Error::invalid("participation", "Participation does not exist.")
            })?;
            if target.event != event.id {
                return Err(Error::invalid(
                    "participation",
                    "Participation belongs to a different event.",
                ));
            }
            if target.user != user.id && !visibility::can_manage(event, user) {
                return Err(Error::forbidden(
                    "You can only add contributions for yourself.",
                ));
            }
            target
        }
        None => participation::resolve_or_create(sdb, event, user).await?,
    };

    let row = CreateContributionItem::new(&event.id, &target, input.item)?;
    let id = row.id.clone();
    db::insert(sdb, CONTRIBUTION_TABLE, row).await?;
    let item: Option<ContributionItem> = sdb.select(id).await?;
    item.ok_or(Error::InternalServerError)
}
