use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::info;
use validator::Validate;

use crate::{
    consts::{
        index::{UNIQ_POLL_OPTION_LABEL, UNIQ_VOTE, UNIQ_VOTE_SUBMISSION},
        table::{POLL_OPTION_TABLE, POLL_TABLE, VOTE_SUBMISSION_TABLE, VOTE_TABLE},
    },
    db::{self, Db, is_transaction_conflict, is_unique_violation},
    errors::{Error, Result},
    models::{
        event::Event,
        poll::{CreatePoll, CreatePollOption, CreateVote, CreateVoteSubmission, Poll, PollOption, Vote},
        user::CurrentUser,
    },
    services::participation,
    utils::{
        record_id::{record_id, record_key, serialize_key},
        time::time_now,
        validator::validate_not_blank,
    },
};

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct PollOptionInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub label: String,
    pub position: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub question: String,
    #[serde(default)]
    pub allows_multiple: bool,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub options: Vec<PollOptionInput>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

pub async fn load_poll(sdb: &Db, poll_id: &RecordId) -> Result<Poll> {
    let poll: Option<Poll> = sdb.select(poll_id.clone()).await?;
    poll.ok_or(Error::NotFound("Poll"))
}

/// Ordered by position, then id.
pub async fn options_of(sdb: &Db, poll_id: &RecordId) -> Result<Vec<PollOption>> {
    let mut options: Vec<PollOption> = sdb
        .query("SELECT * FROM type::table($table) WHERE poll = $poll;")
        .bind(("table", POLL_OPTION_TABLE))
        .bind(("poll", poll_id.clone()))
        .await?
        .take(0)?;
    options.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| record_key(&a.id).cmp(&record_key(&b.id)))
    });
    Ok(options)
}

/// A poll needs two or more distinct option labels. Positions default to list order.
pub async fn create(
    sdb: &Db,
    event: &Event,
    user: &CurrentUser,
    input: CreatePollRequest,
) -> Result<PollView> {
    if input.options.len() < 2 {
        return Err(Error::invalid("options", "A poll needs at least two options."));
    }
    let mut labels = HashSet::new();
    if !input
        .options
        .iter()
        .all(|option| labels.insert(option.label.trim().to_string()))
    {
        return Err(Error::invalid("options", "Option labels must be unique."));
    }

    let poll = CreatePoll::new(
        &event.id,
        input.question.trim().to_string(),
        input.allows_multiple,
        input.opens_at,
        input.closes_at,
        &user.id,
    )?;
    let poll_id = poll.id.clone();
    let options: Vec<CreatePollOption> = input
        .options
        .into_iter()
        .enumerate()
        .map(|(index, option)| {
            CreatePollOption::new(
                &poll_id,
                option.label.trim().to_string(),
                option.position.unwrap_or(index as i64),
            )
        })
        .collect();

    let query = db::begin(sdb)
        .query(format!("INSERT INTO {POLL_TABLE} $poll_row;"))
        .bind(("poll_row", poll))
        .query(format!("INSERT INTO {POLL_OPTION_TABLE} $option_rows;"))
        .bind(("option_rows", options));
    let result = db::commit(query).await;
    if is_unique_violation(&result, UNIQ_POLL_OPTION_LABEL) {
        return Err(Error::invalid("options", "Option labels must be unique."));
    }
    result?;

    info!(event = %event.id, poll = %poll_id, "poll created");
    let poll = load_poll(sdb, &poll_id).await?;
    let options = options_of(sdb, &poll_id).await?;
    Ok(PollView { poll, options })
}

pub async fn list(sdb: &Db, event_id: &RecordId) -> Result<Vec<PollView>> {
    let mut polls: Vec<Poll> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", POLL_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    polls.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut views = Vec::with_capacity(polls.len());
    for poll in polls {
        let options = options_of(sdb, &poll.id).await?;
        views.push(PollView { poll, options });
    }
    Ok(views)
}

#[derive(Serialize, Debug, Clone)]
pub struct VoteReceipt {
    #[serde(serialize_with = "serialize_key")]
    pub poll_id: RecordId,
    pub selected_option_ids: Vec<String>,
}

/// Records the caller's single submission for `poll`.
///
/// The `(poll, user)` unique index on vote submissions is the only "already voted" check;
/// option rows are written behind it in the same transaction.
pub async fn cast_vote(
    sdb: &Db,
    event: &Event,
    poll: &Poll,
    user: &CurrentUser,
    option_ids: Vec<String>,
) -> Result<VoteReceipt> {
    poll.ensure_open_at(time_now())?;

    if option_ids.is_empty() {
        return Err(Error::invalid("option_ids", "Select at least one option."));
    }
    let selected: Vec<RecordId> = option_ids
        .iter()
        .map(|key| record_id(POLL_OPTION_TABLE, key))
        .collect();
    let mut seen = HashSet::new();
    if !selected.iter().all(|id| seen.insert(id.to_string())) {
        return Err(Error::invalid("option_ids", "Duplicate option ids are not allowed."));
    }
    if !poll.allows_multiple && selected.len() != 1 {
        return Err(Error::invalid(
            "option_ids",
            "This poll allows exactly one option.",
        ));
    }

    let options = options_of(sdb, &poll.id).await?;
    let chosen = selected
        .iter()
        .map(|id| {
            options
                .iter()
                .find(|option| &option.id == id)
                .ok_or_else(|| Error::invalid("option_ids", "Invalid option for this poll."))
        })
        .collect::<Result<Vec<_>>>()?;

    let participation = participation::resolve_or_create(sdb, event, user).await?;
    let votes = chosen
        .into_iter()
        .map(|option| CreateVote::new(poll, option, &participation, &user.id))
        .collect::<Result<Vec<_>>>()?;

    let query = db::begin(sdb)
        .query(format!("INSERT INTO {VOTE_SUBMISSION_TABLE} $submission;"))
        .bind(("submission", CreateVoteSubmission::new(&poll.id, &user.id)))
        .query(format!("INSERT INTO {VOTE_TABLE} $vote_rows;"))
        .bind(("vote_rows", votes));
    let result = db::commit(query).await;
    if is_unique_violation(&result, UNIQ_VOTE_SUBMISSION) || is_unique_violation(&result, UNIQ_VOTE)
    {
        return Err(Error::AlreadyVoted);
    }
    // a concurrent submission by the same voter that committed first is still "already voted"
    if is_transaction_conflict(&result) && has_submitted(sdb, &poll.id, &user.id).await? {
        return Err(Error::AlreadyVoted);
    }
    result?;

    info!(poll = %poll.id, user = %user.id, options = selected.len(), "vote cast");
    Ok(VoteReceipt {
        poll_id: poll.id.clone(),
        selected_option_ids: selected.iter().map(record_key).collect(),
    })
}

#[derive(Serialize, Debug, Clone)]
pub struct OptionTally {
    #[serde(serialize_with = "serialize_key")]
    pub id: RecordId,
    pub label: String,
    pub vote_count: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct PollResults {
    #[serde(serialize_with = "serialize_key")]
    pub poll_id: RecordId,
    pub question: String,
    pub allows_multiple: bool,
    pub total_votes: usize,
    pub unique_voters: usize,
    pub options: Vec<OptionTally>,
}

pub async fn has_submitted(sdb: &Db, poll_id: &RecordId, user_id: &RecordId) -> Result<bool> {
    let submissions: Vec<RecordId> = sdb
        .query("SELECT VALUE id FROM type::table($table) WHERE poll = $poll AND user = $user;")
        .bind(("table", VOTE_SUBMISSION_TABLE))
        .bind(("poll", poll_id.clone()))
        .bind(("user", user_id.clone()))
        .await?
        .take(0)?;
    Ok(!submissions.is_empty())
}

pub async fn votes_of(sdb: &Db, poll_id: &RecordId) -> Result<Vec<Vote>> {
    let votes: Vec<Vote> = sdb
        .query("SELECT * FROM type::table($table) WHERE poll = $poll;")
        .bind(("table", VOTE_TABLE))
        .bind(("poll", poll_id.clone()))
        .await?
        .take(0)?;
    Ok(votes)
}

pub async fn results(sdb: &Db, poll: &Poll) -> Result<PollResults> {
    let options = options_of(sdb, &poll.id).await?;
    let votes = votes_of(sdb, &poll.id).await?;
    let voters: HashSet<String> = votes.iter().map(|vote| vote.user.to_string()).collect();

    Ok(PollResults {
        poll_id: poll.id.clone(),
        question: poll.question.clone(),
        allows_multiple: poll.allows_multiple,
        total_votes: votes.len(),
        unique_voters: voters.len(),
        options: options
            .into_iter()
            .map(|option| OptionTally {
                vote_count: votes.iter().filter(|vote| vote.option == option.id).count(),
                id: option.id,
                label: option.label,
            })
            .collect(),
    })
}
