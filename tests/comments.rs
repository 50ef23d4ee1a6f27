mod common;

use hive_api::{
    consts::table::REACTION_TABLE,
    errors::Error,
    services::comment::{self, CreateCommentRequest, ReactionToggle},
    utils::record_id::record_key,
};

use common::{context, count, create_event, register};

fn text(body: &str, parent: Option<String>) -> CreateCommentRequest {
    CreateCommentRequest {
        text: body.to_string(),
        parent,
    }
}

#[tokio::test]
async fn test_replies_are_one_level_deep() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let event = create_event(&ctx.state, &owner, "Book club").await;
    let other = create_event(&ctx.state, &owner, "Chess club").await;
    let sdb = &ctx.state.sdb;

    let top = comment::create(sdb, &event.id, &owner, text("Which book?", None)).await.unwrap();
    let reply = comment::create(sdb, &event.id, &owner, text("Dune", Some(record_key(&top.id))))
        .await
        .unwrap();
    assert_eq!(reply.parent, Some(top.id.clone()));

    let nested = comment::create(sdb, &event.id, &owner, text("Again?", Some(record_key(&reply.id)))).await;
    assert!(matches!(nested, Err(Error::Invalid { ref field, .. }) if field == "parent"));

    let cross = comment::create(sdb, &other.id, &owner, text("Wrong room", Some(record_key(&top.id)))).await;
    assert!(matches!(cross, Err(Error::Invalid { .. })));

    let listed = comment::list(sdb, &event.id, true).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].comment.id, top.id);
    assert_eq!(listed[0].reply_count, 1);
    assert_eq!(
        listed[0].author_detail.as_ref().map(|a| a.username.as_str()),
        Some("owner")
    );
}

#[tokio::test]
async fn test_toggle_reaction_twice_restores_state() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let event = create_event(&ctx.state, &owner, "Movie night").await;
    let sdb = &ctx.state.sdb;
    let top = comment::create(sdb, &event.id, &owner, text("Popcorn?", None)).await.unwrap();

    let added = comment::toggle_reaction(sdb, &top, &owner, " 👍 ").await.unwrap();
    assert!(matches!(added, ReactionToggle::Added(ref r) if r.emoji == "👍"));
    assert_eq!(count(&ctx.state, REACTION_TABLE).await, 1);

    let listed = comment::list(sdb, &event.id, true).await.unwrap();
    assert_eq!(listed[0].reactions.len(), 1);
    assert_eq!(listed[0].reactions[0].emoji, "👍");

    let removed = comment::toggle_reaction(sdb, &top, &owner, "👍").await.unwrap();
    assert!(matches!(removed, ReactionToggle::Removed { ref emoji } if emoji == "👍"));
    assert_eq!(count(&ctx.state, REACTION_TABLE).await, 0);

    comment::toggle_reaction(sdb, &top, &owner, "🎉").await.unwrap();
    comment::toggle_reaction(sdb, &top, &owner, "👍").await.unwrap();
    assert_eq!(count(&ctx.state, REACTION_TABLE).await, 2);
}

#[tokio::test]
async fn test_reactions_hidden_when_listing_without_them() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let event = create_event(&ctx.state, &owner, "Game night").await;
    let sdb = &ctx.state.sdb;
    let first = comment::create(sdb, &event.id, &owner, text("Catan?", None)).await.unwrap();
    let second = comment::create(sdb, &event.id, &owner, text("Or Azul", None)).await.unwrap();
    comment::toggle_reaction(sdb, &first, &owner, "🎲").await.unwrap();
    comment::toggle_reaction(sdb, &second, &owner, "🧩").await.unwrap();

    let listed = comment::list(sdb, &event.id, true).await.unwrap();
    let emojis: Vec<Vec<&str>> = listed
        .iter()
        .map(|view| view.reactions.iter().map(|r| r.emoji.as_str()).collect())
        .collect();
    assert_eq!(emojis, vec![vec!["🎲"], vec!["🧩"]]);

    let bare = comment::list(sdb, &event.id, false).await.unwrap();
    assert_eq!(bare.len(), 2);
    assert!(bare.iter().all(|view| view.reactions.is_empty()));
}
