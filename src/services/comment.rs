use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    consts::{
        index::UNIQ_REACTION,
        table::{COMMENT_TABLE, REACTION_TABLE, USER_TABLE},
    },
    db::{self, Db, is_unique_violation},
    errors::{Error, Result},
    models::{
        comment::{Comment, CreateComment, CreateReaction, Reaction},
        user::{CurrentUser, User, UserSummary},
    },
    utils::{record_id::record_id, validator::validate_not_blank},
};

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub text: String,
    pub parent: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Validate)]
pub struct ReactionRequest {
    #[validate(length(min = 1, max = 32), custom(function = "validate_not_blank"))]
    pub emoji: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_detail: Option<UserSummary>,
    pub reply_count: usize,
    pub reactions: Vec<Reaction>,
}

pub async fn load_comment(sdb: &Db, comment_id: &RecordId) -> Result<Comment> {
    let comment: Option<Comment> = sdb.select(comment_id.clone()).await?;
    comment.ok_or(Error::NotFound("Comment"))
}

pub async fn create(
    sdb: &Db,
    event_id: &RecordId,
    author: &CurrentUser,
    input: CreateCommentRequest,
) -> Result<Comment> {
    let parent = match input.parent.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let parent: Option<Comment> = sdb.select(record_id(COMMENT_TABLE, key)).await?;
            Some(parent.ok_or_else(|| Error::invalid("parent", "Parent comment does not exist."))?)
        }
        _ => None,
    };
    let row = CreateComment::new(event_id, &author.id, parent.as_ref(), &input.text)?;
    let id = row.id.clone();
    db::insert(sdb, COMMENT_TABLE, row).await?;
    debug!(event = %event_id, comment = %id, "comment posted");
    load_comment(sdb, &id).await
}

/// Top-level comments, oldest first, each with its reply count. Reactions are attached
/// only when `with_reactions` is set.
pub async fn list(sdb: &Db, event_id: &RecordId, with_reactions: bool) -> Result<Vec<CommentView>> {
    let mut comments: Vec<Comment> = sdb
        .query("SELECT * FROM type::table($table) WHERE event = $event;")
        .bind(("table", COMMENT_TABLE))
        .bind(("event", event_id.clone()))
        .await?
        .take(0)?;
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let (top_level, replies): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(|comment| comment.parent.is_none());

    let author_ids: Vec<RecordId> = top_level.iter().map(|c| c.author.clone()).collect();
    let authors: Vec<User> = sdb
        .query("SELECT * FROM type::table($table) WHERE id IN $authors;")
        .bind(("table", USER_TABLE))
        .bind(("authors", author_ids))
        .await?
        .take(0)?;

    let mut views = Vec::with_capacity(top_level.len());
    for comment in top_level {
        let reactions = if with_reactions {
            reactions_of(sdb, &comment.id).await?
        } else {
            Vec::new()
        };
        views.push(CommentView {
            author_detail: authors
                .iter()
                .find(|user| user.id == comment.author)
                .map(UserSummary::from),
            reply_count: replies
                .iter()
                .filter(|reply| reply.parent.as_ref() == Some(&comment.id))
                .count(),
            reactions,
            comment,
        });
    }
    Ok(views)
}

/// Oldest first.
pub async fn reactions_of(sdb: &Db, comment_id: &RecordId) -> Result<Vec<Reaction>> {
    let mut reactions: Vec<Reaction> = sdb
        .query("SELECT * FROM type::table($table) WHERE comment = $comment;")
        .bind(("table", REACTION_TABLE))
        .bind(("comment", comment_id.clone()))
        .await?
        .take(0)?;
    reactions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(reactions)
}

#[derive(Debug, Clone)]
pub enum ReactionToggle {
    Added(Reaction),
    Removed { emoji: String },
}

/// Adds the `(comment, user, emoji)` reaction, or removes it when it already exists.
pub async fn toggle_reaction(
    sdb: &Db,
    comment: &Comment,
    user: &CurrentUser,
    emoji: &str,
) -> Result<ReactionToggle> {
    let emoji = emoji.trim().to_string();
    let existing: Vec<Reaction> = sdb
        .query("SELECT * FROM type::table($table) WHERE comment = $comment AND user = $user AND emoji = $emoji;")
        .bind(("table", REACTION_TABLE))
        .bind(("comment", comment.id.clone()))
        .bind(("user", user.id.clone()))
        .bind(("emoji", emoji.clone()))
        .await?
        .take(0)?;

    if let Some(reaction) = existing.into_iter().next() {
        let _: Option<Reaction> = sdb.delete(reaction.id.clone()).await?;
        info!(comment = %comment.id, user = %user.id, emoji, "reaction removed");
        return Ok(ReactionToggle::Removed { emoji });
    }

    let row = CreateReaction::new(&comment.id, &user.id, &emoji);
    let result = db::insert(sdb, REACTION_TABLE, row.clone()).await;
    if is_unique_violation(&result, UNIQ_REACTION) {
        return Err(Error::Conflict(
            "The same reaction was toggled concurrently.".to_string(),
        ));
    }
    result?;
    info!(comment = %comment.id, user = %user.id, emoji, "reaction added");
    Ok(ReactionToggle::Added(row.into()))
}
