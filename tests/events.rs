mod common;

use std::collections::HashMap;

use chrono::{Duration, Utc};
use hive_api::{
    consts::table::{
        COMMENT_TABLE, CONTRIBUTION_TABLE, CUSTOM_FIELD_DEFINITION_TABLE, CUSTOM_FIELD_VALUE_TABLE,
        EVENT_TABLE, INVITATION_TABLE, PARTICIPATION_TABLE, POLL_OPTION_TABLE, POLL_TABLE,
        REACTION_TABLE, VOTE_SUBMISSION_TABLE, VOTE_TABLE,
    },
    errors::Error,
    models::{invitation::InvitationStatus, participation::RsvpStatus},
    services::{
        comment::{self, CreateCommentRequest},
        contribution,
        custom_field,
        event::{self, PageParams, UpdateEventRequest},
        invitation::{self, CreateInvitationsRequest},
        participation,
        poll::{self, CreatePollRequest, PollOptionInput},
        visibility,
    },
    utils::record_id::record_key,
};

use common::{context, count, create_event, event_request, register};

#[tokio::test]
async fn test_owner_participation_is_accepted_on_create() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;

    let event = create_event(&ctx.state, &owner, "Potluck").await;
    assert_eq!(event.owner, owner.id);
    assert!(event.ends_at.is_none());

    let participation = visibility::find_participation(&ctx.state.sdb, &event.id, &owner.id)
        .await
        .unwrap()
        .expect("owner participation");
    assert_eq!(participation.rsvp_status, RsvpStatus::Accepted);
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;

    let mut request = event_request("Backwards");
    request.ends_at = Some(request.starts_at - Duration::hours(1));
    let result = event::create(&ctx.state.sdb, &owner, request).await;
    assert!(matches!(result, Err(Error::Invalid { ref field, .. }) if field == "ends_at"));
    assert_eq!(count(&ctx.state, EVENT_TABLE).await, 0);
    assert_eq!(count(&ctx.state, PARTICIPATION_TABLE).await, 0);
}

#[tokio::test]
async fn test_strangers_cannot_see_or_manage() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let stranger = register(&ctx.state, "stranger").await;
    let event = create_event(&ctx.state, &owner, "Private").await;

    assert!(!visibility::can_access(&ctx.state.sdb, &event, &stranger).await.unwrap());
    assert!(visibility::can_access(&ctx.state.sdb, &event, &owner).await.unwrap());
    assert!(matches!(
        visibility::ensure_event_access(&ctx.state.sdb, &event.id, &stranger).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        visibility::ensure_event_owner(&ctx.state.sdb, &event.id, &stranger).await,
        Err(Error::Forbidden(_))
    ));
    assert!(matches!(
        participation::resolve_or_create(&ctx.state.sdb, &event, &stranger).await,
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_update_validates_merged_window() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let event = create_event(&ctx.state, &owner, "Brunch").await;

    let bad = UpdateEventRequest {
        ends_at: Some(Some(event.starts_at - Duration::minutes(30))),
        ..Default::default()
    };
    let result = event::update(&ctx.state.sdb, event.clone(), bad).await;
    assert!(matches!(result, Err(Error::Invalid { .. })));

    let good = UpdateEventRequest {
        title: Some("Late brunch".to_string()),
        ends_at: Some(Some(event.starts_at + Duration::hours(3))),
        ..Default::default()
    };
    let updated = event::update(&ctx.state.sdb, event.clone(), good).await.unwrap();
    assert_eq!(updated.title, "Late brunch");
    assert_eq!(updated.location, event.location);
    assert_eq!(updated.ends_at, Some(event.starts_at + Duration::hours(3)));

    // leaving the key out keeps the end, an explicit null clears it
    let untouched = event::update(&ctx.state.sdb, updated.clone(), UpdateEventRequest::default())
        .await
        .unwrap();
    assert_eq!(untouched.ends_at, updated.ends_at);
    let cleared: UpdateEventRequest = serde_json::from_value(serde_json::json!({ "ends_at": null })).unwrap();
    let cleared = event::update(&ctx.state.sdb, untouched, cleared).await.unwrap();
    assert!(cleared.ends_at.is_none());
}

#[tokio::test]
async fn test_list_only_returns_visible_events_in_start_order() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let guest = register(&ctx.state, "guest").await;

    let mut later = event_request("Later");
    later.starts_at = Utc::now() + Duration::days(30);
    let later = event::create(&ctx.state.sdb, &owner, later).await.unwrap();
    let sooner = create_event(&ctx.state, &owner, "Sooner").await;
    let _hidden = create_event(&ctx.state, &guest, "Guest only").await;

    let page = event::list(&ctx.state.sdb, &owner, PageParams::default(), 20)
        .await
        .unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.page, 1);
    let ids: Vec<_> = page.results.iter().map(|e| e.id.clone()).collect();
    assert_eq!(ids, vec![sooner.id.clone(), later.id.clone()]);

    // invited guests see the event too
    invitation::create_invitations(
        &ctx.state.sdb,
        &later,
        &owner,
        CreateInvitationsRequest {
            user_ids: vec![record_key(&guest.id)],
            ..Default::default()
        },
        168,
    )
    .await
    .unwrap();
    let page = event::list(&ctx.state.sdb, &guest, PageParams::default(), 20)
        .await
        .unwrap();
    assert_eq!(page.count, 2);

    let second = event::list(
        &ctx.state.sdb,
        &owner,
        PageParams {
            page: Some(2),
            page_size: Some(1),
        },
        20,
    )
    .await
    .unwrap();
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.results[0].id, later.id);

    let beyond = event::list(
        &ctx.state.sdb,
        &owner,
        PageParams {
            page: Some(5),
            page_size: Some(1),
        },
        20,
    )
    .await;
    assert!(matches!(beyond, Err(Error::NotFound(_))));

    let huge = event::list(
        &ctx.state.sdb,
        &owner,
        PageParams {
            page: Some(usize::MAX),
            page_size: Some(50),
        },
        20,
    )
    .await;
    assert!(matches!(huge, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_cascades_children() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let guest = register(&ctx.state, "guest").await;
    let event = create_event(&ctx.state, &owner, "Doomed").await;

    let issued = invitation::create_invitations(
        &ctx.state.sdb,
        &event,
        &owner,
        CreateInvitationsRequest {
            emails: vec![guest.email.clone()],
            ..Default::default()
        },
        168,
    )
    .await
    .unwrap();
    invitation::respond(&ctx.state.sdb, &issued[0].token, &guest, InvitationStatus::Accepted)
        .await
        .unwrap();

    let created = poll::create(
        &ctx.state.sdb,
        &event,
        &owner,
        CreatePollRequest {
            question: "Snacks?".to_string(),
            allows_multiple: false,
            opens_at: None,
            closes_at: None,
            options: vec![
                PollOptionInput { label: "Chips".to_string(), position: None },
                PollOptionInput { label: "Fruit".to_string(), position: None },
            ],
        },
    )
    .await
    .unwrap();
    poll::cast_vote(
        &ctx.state.sdb,
        &event,
        &created.poll,
        &guest,
        vec![record_key(&created.options[0].id)],
    )
    .await
    .unwrap();
    let owner_participation = participation::resolve_or_create(&ctx.state.sdb, &event, &owner)
        .await
        .unwrap();
    contribution::replace(
        &ctx.state.sdb,
        &event.id,
        &owner_participation,
        vec![serde_json::from_value(serde_json::json!({ "item_name": "Cake" })).unwrap()],
    )
    .await
    .unwrap();

    let topic = comment::create(
        &ctx.state.sdb,
        &event.id,
        &guest,
        CreateCommentRequest {
            text: "See you there".to_string(),
            parent: None,
        },
    )
    .await
    .unwrap();
    comment::toggle_reaction(&ctx.state.sdb, &topic, &owner, "🎈").await.unwrap();
    custom_field::create_definition(
        &ctx.state.sdb,
        &event.id,
        serde_json::from_value(serde_json::json!({ "label": "Diet", "field_type": "text" })).unwrap(),
    )
    .await
    .unwrap();
    custom_field::save_answers(
        &ctx.state.sdb,
        &owner_participation,
        &HashMap::from([("diet".to_string(), serde_json::json!("none"))]),
    )
    .await
    .unwrap();

    // a neighbouring event keeps its own rows
    let survivor = create_event(&ctx.state, &owner, "Survivor").await;
    poll::create(
        &ctx.state.sdb,
        &survivor,
        &owner,
        CreatePollRequest {
            question: "Music?".to_string(),
            allows_multiple: true,
            opens_at: None,
            closes_at: None,
            options: vec![
                PollOptionInput { label: "Jazz".to_string(), position: None },
                PollOptionInput { label: "Folk".to_string(), position: None },
            ],
        },
    )
    .await
    .unwrap();

    event::delete(&ctx.state.sdb, &event).await.unwrap();

    for table in [
        INVITATION_TABLE,
        VOTE_TABLE,
        VOTE_SUBMISSION_TABLE,
        CONTRIBUTION_TABLE,
        COMMENT_TABLE,
        REACTION_TABLE,
        CUSTOM_FIELD_DEFINITION_TABLE,
        CUSTOM_FIELD_VALUE_TABLE,
    ] {
        assert_eq!(count(&ctx.state, table).await, 0, "{table} not emptied");
    }
    assert_eq!(count(&ctx.state, EVENT_TABLE).await, 1);
    assert_eq!(count(&ctx.state, PARTICIPATION_TABLE).await, 1);
    assert_eq!(count(&ctx.state, POLL_TABLE).await, 1);
    assert_eq!(count(&ctx.state, POLL_OPTION_TABLE).await, 2);
    assert!(matches!(
        visibility::load_event(&ctx.state.sdb, &event.id).await,
        Err(Error::NotFound(_))
    ));
}
