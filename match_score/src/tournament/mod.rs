//! Tournament lifecycle: creation, bracket pairing, stage progression and
//! prize payout.
//!
//! ## Example
//!
//! ```no_run
//! use match_score::auth::{Actor, Role};
//! use match_score::context::EngineContext;
//! use match_score::db::MemoryStore;
//! use match_score::notify::LogNotifier;
//! use match_score::settings::CompetitionSettings;
//! use match_score::tournament::{NewTournament, TournamentFormat, TournamentManager};
//! use chrono::{Duration, Utc};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = Arc::new(EngineContext::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(LogNotifier),
//!         CompetitionSettings::default(),
//!     ));
//!     let tournaments = TournamentManager::new(ctx);
//!
//!     let director = Actor::new(Uuid::new_v4(), Role::Director);
//!     let tournament = tournaments
//!         .create_tournament(
//!             &director,
//!             NewTournament {
//!                 title: "Spring Cup".to_string(),
//!                 format: TournamentFormat::OneOffMatch,
//!                 start_date: Utc::now() + Duration::days(3),
//!                 prize_pool: 10_000,
//!                 team_names: vec!["Falcons".to_string(), "Owls".to_string()],
//!             },
//!         )
//!         .await?;
//!     println!("Created tournament: {}", tournament.id);
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;
pub mod pairing;
pub mod prizes;
pub mod progression;
pub mod rules;
pub mod standings;

pub use manager::TournamentManager;
pub use models::{
    NewTournament, Period, PrizeCut, Stage, Tournament, TournamentDetail, TournamentFilter,
    TournamentFormat, TournamentId, TournamentPatch, TournamentStatus, next_stage,
};
pub use prizes::PrizeStructure;
