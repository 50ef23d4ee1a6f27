mod common;

use chrono::{Duration, Utc};
use hive_api::{
    consts::table::{PARTICIPATION_TABLE, VOTE_SUBMISSION_TABLE, VOTE_TABLE},
    errors::Error,
    models::{event::Event, invitation::InvitationStatus, user::CurrentUser},
    services::{
        account,
        invitation::{self, CreateInvitationsRequest},
        poll::{self, CreatePollRequest, PollOptionInput, PollView},
    },
    state::AppState,
    utils::record_id::record_key,
};

use common::{context, count, create_event, register};

fn request(allows_multiple: bool, labels: &[&str]) -> CreatePollRequest {
    CreatePollRequest {
        question: "What should we eat?".to_string(),
        allows_multiple,
        opens_at: None,
        closes_at: None,
        options: labels
            .iter()
            .map(|label| PollOptionInput {
                label: label.to_string(),
                position: None,
            })
            .collect(),
    }
}

async fn setup(state: &AppState, allows_multiple: bool, labels: &[&str]) -> (Event, CurrentUser, PollView) {
    let owner = register(state, "owner").await;
    let voter = register(state, "voter").await;
    let event = create_event(state, &owner, "Game night").await;
    let issued = invitation::create_invitations(
        &state.sdb,
        &event,
        &owner,
        CreateInvitationsRequest {
            emails: vec![voter.email.clone()],
            ..Default::default()
        },
        168,
    )
    .await
    .unwrap();
    invitation::respond(&state.sdb, &issued[0].token, &voter, InvitationStatus::Accepted)
        .await
        .unwrap();
    let view = poll::create(&state.sdb, &event, &owner, request(allows_multiple, labels))
        .await
        .unwrap();
    (event, voter, view)
}

fn option_key(view: &PollView, index: usize) -> String {
    record_key(&view.options[index].id)
}

#[tokio::test]
async fn test_single_choice_votes_once() {
    let ctx = context().await;
    let (event, voter, view) = setup(&ctx.state, false, &["Pizza", "Tacos"]).await;

    let receipt = poll::cast_vote(&ctx.state.sdb, &event, &view.poll, &voter, vec![option_key(&view, 0)])
        .await
        .unwrap();
    assert_eq!(receipt.selected_option_ids, vec![option_key(&view, 0)]);

    let again = poll::cast_vote(&ctx.state.sdb, &event, &view.poll, &voter, vec![option_key(&view, 1)]).await;
    assert!(matches!(again, Err(Error::AlreadyVoted)));
    assert_eq!(count(&ctx.state, VOTE_TABLE).await, 1);
    assert_eq!(count(&ctx.state, VOTE_SUBMISSION_TABLE).await, 1);
}

#[tokio::test]
async fn test_multiple_choice_keeps_first_submission() {
    let ctx = context().await;
    let (event, voter, view) = setup(&ctx.state, true, &["Red", "Green", "Blue"]).await;

    poll::cast_vote(
        &ctx.state.sdb,
        &event,
        &view.poll,
        &voter,
        vec![option_key(&view, 0), option_key(&view, 1)],
    )
    .await
    .unwrap();
    assert_eq!(count(&ctx.state, VOTE_TABLE).await, 2);

    let again = poll::cast_vote(&ctx.state.sdb, &event, &view.poll, &voter, vec![option_key(&view, 2)]).await;
    assert!(matches!(again, Err(Error::AlreadyVoted)));
    assert_eq!(count(&ctx.state, VOTE_TABLE).await, 2);

    let results = poll::results(&ctx.state.sdb, &view.poll).await.unwrap();
    assert_eq!(results.total_votes, 2);
    assert_eq!(results.unique_voters, 1);
    let counts: Vec<usize> = results.options.iter().map(|o| o.vote_count).collect();
    assert_eq!(counts, vec![1, 1, 0]);
    let labels: Vec<&str> = results.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Red", "Green", "Blue"]);
}

#[tokio::test]
async fn test_selection_rules() {
    let ctx = context().await;
    let (event, voter, view) = setup(&ctx.state, false, &["Yes", "No"]).await;
    let sdb = &ctx.state.sdb;

    let empty = poll::cast_vote(sdb, &event, &view.poll, &voter, vec![]).await;
    assert!(matches!(empty, Err(Error::Invalid { .. })));

    let both = poll::cast_vote(sdb, &event, &view.poll, &voter, vec![option_key(&view, 0), option_key(&view, 1)]).await;
    assert!(matches!(both, Err(Error::Invalid { .. })));

    let dup = poll::cast_vote(sdb, &event, &view.poll, &voter, vec![option_key(&view, 0), option_key(&view, 0)]).await;
    assert!(matches!(dup, Err(Error::Invalid { .. })));

    let foreign = poll::cast_vote(sdb, &event, &view.poll, &voter, vec!["doesnotexist".to_string()]).await;
    assert!(matches!(foreign, Err(Error::Invalid { .. })));

    // nothing was recorded, so a valid vote still goes through
    assert_eq!(count(&ctx.state, VOTE_SUBMISSION_TABLE).await, 0);
    poll::cast_vote(sdb, &event, &view.poll, &voter, vec![option_key(&view, 1)])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_closed_and_future_polls_reject_votes() {
    let ctx = context().await;
    let (event, voter, _) = setup(&ctx.state, false, &["A", "B"]).await;
    let owner_id = event.owner.clone();
    let owner = CurrentUser {
        id: owner_id,
        username: "owner".to_string(),
        email: "owner@example.com".to_string(),
    };

    let mut closed = request(false, &["A", "B"]);
    closed.question = "Closed".to_string();
    closed.opens_at = Some(Utc::now() - Duration::days(2));
    closed.closes_at = Some(Utc::now() - Duration::days(1));
    let closed = poll::create(&ctx.state.sdb, &event, &owner, closed).await.unwrap();
    let result = poll::cast_vote(&ctx.state.sdb, &event, &closed.poll, &voter, vec![option_key(&closed, 0)]).await;
    assert!(matches!(result, Err(Error::Invalid { .. })));

    let mut future = request(false, &["A", "B"]);
    future.opens_at = Some(Utc::now() + Duration::days(1));
    let future = poll::create(&ctx.state.sdb, &event, &owner, future).await.unwrap();
    let result = poll::cast_vote(&ctx.state.sdb, &event, &future.poll, &voter, vec![option_key(&future, 0)]).await;
    assert!(matches!(result, Err(Error::Invalid { .. })));

    let listed = poll::list(&ctx.state.sdb, &event.id).await.unwrap();
    assert_eq!(listed.len(), 3);
    for view in &listed {
        let labels: Vec<&str> = view.options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert!(view.options.iter().all(|o| o.poll == view.poll.id));
    }
}

#[tokio::test]
async fn test_poll_creation_rules() {
    let ctx = context().await;
    let owner = register(&ctx.state, "owner").await;
    let event = create_event(&ctx.state, &owner, "Vote").await;

    let one = poll::create(&ctx.state.sdb, &event, &owner, request(false, &["Only"])).await;
    assert!(matches!(one, Err(Error::Invalid { .. })));

    let dup = poll::create(&ctx.state.sdb, &event, &owner, request(false, &["Same", " Same "])).await;
    assert!(matches!(dup, Err(Error::Invalid { .. })));

    let mut custom = request(false, &["Second", "First"]);
    custom.options[0].position = Some(5);
    custom.options[1].position = Some(1);
    let view = poll::create(&ctx.state.sdb, &event, &owner, custom).await.unwrap();
    let labels: Vec<&str> = view.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["First", "Second"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_leave_one_submission() {
    let ctx = context().await;
    let (event, _, view) = setup(&ctx.state, false, &["Pizza", "Tacos"]).await;
    // invited but never answered, so the first vote also creates the participation
    let newcomer = register(&ctx.state, "newcomer").await;
    let owner = event_owner(&ctx.state, &event).await;
    invitation::create_invitations(
        &ctx.state.sdb,
        &event,
        &owner,
        CreateInvitationsRequest {
            emails: vec![newcomer.email.clone()],
            ..Default::default()
        },
        168,
    )
    .await
    .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let sdb = ctx.state.sdb.clone();
            let (event, poll, voter) = (event.clone(), view.poll.clone(), newcomer.clone());
            let option = option_key(&view, i % 2);
            tokio::spawn(async move { poll::cast_vote(&sdb, &event, &poll, &voter, vec![option]).await })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(Error::AlreadyVoted) | Err(Error::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(count(&ctx.state, VOTE_SUBMISSION_TABLE).await, 1);
    assert_eq!(count(&ctx.state, VOTE_TABLE).await, 1);
    assert_eq!(count(&ctx.state, PARTICIPATION_TABLE).await, 3);
}

async fn event_owner(state: &AppState, event: &Event) -> CurrentUser {
    account::load_user(&state.sdb, event.owner.clone())
        .await
        .unwrap()
        .unwrap()
}
