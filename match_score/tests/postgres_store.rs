//! Integration tests for the PostgreSQL store.
//!
//! These need a reachable database. Run with:
//! `DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`

use chrono::{Duration, Utc};
use match_score::auth::{Actor, Role, User};
use match_score::context::{EngineContext, OrderedShuffler};
use match_score::db::{Database, DatabaseConfig, PgStore, Store};
use match_score::notify::LogNotifier;
use match_score::settings::CompetitionSettings;
use match_score::team::Team;
use match_score::tournament::{NewTournament, Stage, TournamentFormat, TournamentManager};
use serial_test::serial;
use std::sync::Arc;

/// Suffix that keeps names unique across runs
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Helper to create a migrated test database
async fn setup_test_db() -> Database {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/match_score_test".to_string());

    let db = Database::new(&DatabaseConfig::testing(database_url))
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    db
}

fn store(db: &Database) -> Arc<PgStore> {
    Arc::new(PgStore::new(Arc::new(db.pool().clone())))
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
#[serial]
async fn test_commit_persists_and_rollback_discards() {
    let db = setup_test_db().await;
    let store = store(&db);

    let kept = Team::new(unique("kept"));
    let mut uow = store.begin().await.unwrap();
    uow.insert_team(&kept).await.unwrap();
    uow.commit().await.unwrap();

    let dropped = Team::new(unique("dropped"));
    let mut uow = store.begin().await.unwrap();
    uow.insert_team(&dropped).await.unwrap();
    uow.rollback().await.unwrap();

    let mut uow = store.begin().await.unwrap();
    assert_eq!(uow.find_team(kept.id).await.unwrap(), Some(kept.clone()));
    assert!(uow.find_team(dropped.id).await.unwrap().is_none());
    assert_eq!(
        uow.find_team_by_name(&kept.name).await.unwrap().map(|t| t.id),
        Some(kept.id)
    );
    uow.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
#[serial]
async fn test_unique_violation_is_a_conflict() {
    let db = setup_test_db().await;
    let store = store(&db);

    let team = Team::new(unique("twin"));
    let mut uow = store.begin().await.unwrap();
    uow.insert_team(&team).await.unwrap();

    let twin = Team::new(team.name.clone());
    let err = uow.insert_team(&twin).await.unwrap_err();
    assert!(matches!(err, match_score::CoreError::Conflict(_)));
    uow.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
#[serial]
async fn test_create_tournament_round_trip() {
    let db = setup_test_db().await;
    let store = store(&db);

    let director = User::new(format!("{}@example.com", unique("director")), Role::Director);
    let mut uow = store.begin().await.unwrap();
    uow.insert_user(&director).await.unwrap();
    uow.commit().await.unwrap();

    let ctx = EngineContext::new(store, Arc::new(LogNotifier), CompetitionSettings::default())
        .with_shuffler(Arc::new(OrderedShuffler));
    let tournaments = TournamentManager::new(Arc::new(ctx));

    let title = unique("pg-cup");
    let tournament = tournaments
        .create_tournament(
            &Actor::from(&director),
            NewTournament {
                title: title.clone(),
                format: TournamentFormat::SingleElimination,
                start_date: Utc::now() + Duration::days(3),
                prize_pool: 5_000,
                team_names: (0..8).map(|i| format!("{title}-team-{i}")).collect(),
            },
        )
        .await
        .unwrap();

    let detail = tournaments.get_tournament(tournament.id).await.unwrap();
    assert_eq!(detail.tournament.title, title);
    assert_eq!(detail.tournament.current_stage, Stage::QuarterFinal);
    assert_eq!(detail.teams.len(), 8);
    assert_eq!(detail.matches.len(), 4);
    let amounts: Vec<i64> = detail.prize_cuts.iter().map(|c| c.amount).collect();
    assert_eq!(amounts, vec![3_500, 1_500]);

    db.close().await;
}
