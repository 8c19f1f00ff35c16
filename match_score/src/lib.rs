//! # Match Score
//!
//! Tournament engine for esports competitions: brackets, match scoring,
//! stage progression and prize payout.
//!
//! Every public operation runs inside a single unit of work against a
//! [`db::Store`]. Either everything it touched is committed, or nothing is.
//! Emails queued along the way are sent only after the commit.
//!
//! ## Lifecycle
//!
//! A tournament opens at a stage fixed by its format and team count:
//!
//! - **SingleElimination**: 8 teams open at QuarterFinal, 4 at SemiFinal
//! - **RoundRobin**: 4 or 5 teams play a GroupStage, the top 2 meet in the Final
//! - **OneOffMatch**: 2 teams play the Final
//!
//! Scoring a round may finish the match. When the last open match of a stage
//! finishes, the next stage is paired and scheduled. Winning the Final pays
//! out 70% of the prize pool to the winner and the rest to the runner-up.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Creation, pairing, progression and prizes
//! - [`game`]: Match scoring and finalization
//! - [`team`]: Teams, players and statistics
//! - [`requests`]: Director promotion and player link requests
//! - [`db`]: Repository traits with PostgreSQL and in-memory stores
//!
//! ## Example
//!
//! ```
//! use match_score::game::{MatchFormat, Side};
//!
//! assert_eq!(MatchFormat::Mr15.as_str(), "MR15");
//! assert_eq!(Side::Team1.opponent(), Side::Team2);
//! ```

/// User accounts and caller identity.
pub mod auth;

/// Default competition constants.
pub mod constants;

/// Shared dependencies of the managers.
pub mod context;

/// Persistence: stores, units of work and repositories.
pub mod db;

/// Engine error type.
pub mod error;

/// Match scoring and finalization.
pub mod game;

/// Email notifications.
pub mod notify;

/// Promotion and link requests.
pub mod requests;

/// Tunable competition settings.
pub mod settings;

/// Teams, players and statistics.
pub mod team;

/// Tournament lifecycle.
pub mod tournament;

/// Authorization and input checks.
pub mod validation;

pub use auth::{Actor, Role, UserManager};
pub use context::{EngineContext, RandomShuffler, TeamShuffler};
pub use error::{CoreError, CoreResult};
pub use game::MatchManager;
pub use notify::{LogNotifier, Notifier};
pub use requests::RequestManager;
pub use settings::CompetitionSettings;
pub use team::{PlayerManager, TeamManager};
pub use tournament::TournamentManager;
