//! Integration tests for player link and director promotion requests.

use match_score::CoreError;
use match_score::auth::{Actor, Role, UserManager};
use match_score::context::EngineContext;
use match_score::db::{MemoryStore, Page};
use match_score::notify::RecordingNotifier;
use match_score::requests::{
    Decision, RequestFilter, RequestManager, RequestStatus, RequestType, SortOrder,
};
use match_score::settings::CompetitionSettings;
use match_score::team::{NewPlayer, PlayerManager};
use std::sync::Arc;

struct Fixture {
    users: UserManager,
    players: PlayerManager,
    requests: RequestManager,
    notifier: Arc<RecordingNotifier>,
    admin: Actor,
}

async fn fixture() -> Fixture {
    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = Arc::new(EngineContext::new(
        Arc::new(MemoryStore::new()),
        notifier.clone(),
        CompetitionSettings::default(),
    ));
    let users = UserManager::new(ctx.clone());
    let admin = Actor::from(&users.create_user("admin@example.com", Role::Admin).await.unwrap());

    let players = PlayerManager::new(ctx.clone());
    players
        .create_player(
            &admin,
            NewPlayer {
                username: "ace".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Stone".to_string(),
                country: "UA".to_string(),
                avatar: None,
                team_name: None,
            },
        )
        .await
        .unwrap();

    Fixture {
        users,
        players,
        requests: RequestManager::new(ctx),
        notifier,
        admin,
    }
}

async fn user(f: &Fixture, email: &str) -> Actor {
    Actor::from(&f.users.create_user(email, Role::User).await.unwrap())
}

#[tokio::test]
async fn test_accepted_link_makes_user_a_player() {
    let f = fixture().await;
    let fan = user(&f, "fan@example.com").await;

    let request = f.requests.send_link_request(&fan, "ace").await.unwrap();
    assert_eq!(request.request_type, RequestType::LinkUserToPlayer);
    assert_eq!(request.username.as_deref(), Some("ace"));

    f.requests
        .respond(&f.admin, request.id, Decision::Accept)
        .await
        .unwrap();

    assert_eq!(f.users.get_user(fan.id).await.unwrap().role, Role::Player);
    let linked = f.players.get_player_for_user(&fan).await.unwrap();
    assert_eq!(linked.player.username, "ace");

    let sent = f.notifier.with_subject("Request Accepted").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].message,
        "Your request to be linked to the player 'ace' has been accepted."
    );

    let other = user(&f, "other@example.com").await;
    assert!(matches!(
        f.requests.send_link_request(&other, "ace").await,
        Err(CoreError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_second_accept_for_same_player_is_rolled_back() {
    let f = fixture().await;
    let first = user(&f, "first@example.com").await;
    let second = user(&f, "second@example.com").await;

    let first_request = f.requests.send_link_request(&first, "ace").await.unwrap();
    let second_request = f.requests.send_link_request(&second, "ace").await.unwrap();

    f.requests
        .respond(&f.admin, first_request.id, Decision::Accept)
        .await
        .unwrap();
    assert!(matches!(
        f.requests
            .respond(&f.admin, second_request.id, Decision::Accept)
            .await,
        Err(CoreError::Conflict(_))
    ));

    // Still pending, and the second user kept their role
    let own = f
        .requests
        .list_own_requests(&second, Page::default())
        .await
        .unwrap();
    assert_eq!(own[0].status, RequestStatus::Pending);
    assert_eq!(f.users.get_user(second.id).await.unwrap().role, Role::User);

    // It can still be rejected
    f.requests
        .respond(&f.admin, second_request.id, Decision::Reject)
        .await
        .unwrap();
    let rejected = f.notifier.with_subject("Request Rejected").await;
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].recipient, "second@example.com");
    assert_eq!(
        rejected[0].message,
        "Your request to be linked to the player 'ace' has been rejected."
    );
}

#[tokio::test]
async fn test_admin_listing_filters_and_orders() {
    let f = fixture().await;
    let a = user(&f, "a@example.com").await;
    let b = user(&f, "b@example.com").await;
    let c = user(&f, "c@example.com").await;

    let ra = f.requests.send_director_request(&a).await.unwrap();
    let rb = f.requests.send_director_request(&b).await.unwrap();
    f.requests.send_link_request(&c, "ace").await.unwrap();

    f.requests
        .respond(&f.admin, ra.id, Decision::Accept)
        .await
        .unwrap();

    let promotions = f
        .requests
        .list_requests(
            &f.admin,
            &RequestFilter {
                request_type: Some(RequestType::PromoteUserToDirector),
                order: SortOrder::Asc,
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(promotions.len(), 2);
    assert!(promotions.iter().any(|r| r.id == rb.id));
    assert!(
        promotions
            .windows(2)
            .all(|w| w[0].request_date <= w[1].request_date)
    );

    let answered_by_me = f
        .requests
        .list_requests(
            &f.admin,
            &RequestFilter {
                admin_id: Some(f.admin.id),
                ..Default::default()
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(answered_by_me.len(), 1);
    assert_eq!(answered_by_me[0].status, RequestStatus::Accepted);

    let pending = f
        .requests
        .list_requests(
            &f.admin,
            &RequestFilter {
                status: Some(RequestStatus::Pending),
                ..Default::default()
            },
            Page::new(0, 1),
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}
