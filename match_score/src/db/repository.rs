//! Repository trait definitions for testability and dependency injection.
//!
//! The engine never talks to a connection directly. Every operation opens a
//! [`UnitOfWork`] from a [`Store`], reads and writes through the
//! [`Repository`] methods, then commits or rolls back as a whole.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Page;
use crate::auth::{User, UserId};
use crate::error::CoreResult;
use crate::game::{Match, MatchFilter, MatchId};
use crate::requests::{Request, RequestFilter, RequestId};
use crate::team::{Player, PlayerId, Team, TeamFilter, TeamId};
use crate::tournament::{PrizeCut, Tournament, TournamentFilter, TournamentId};

/// Entity access inside one unit of work
#[async_trait]
pub trait Repository: Send {
    // Users

    async fn insert_user(&mut self, user: &User) -> CoreResult<()>;

    async fn find_user(&mut self, user_id: UserId) -> CoreResult<Option<User>>;

    async fn update_user(&mut self, user: &User) -> CoreResult<()>;

    // Tournaments

    async fn insert_tournament(&mut self, tournament: &Tournament) -> CoreResult<()>;

    async fn find_tournament(&mut self, id: TournamentId) -> CoreResult<Option<Tournament>>;

    async fn find_tournament_by_title(&mut self, title: &str) -> CoreResult<Option<Tournament>>;

    async fn update_tournament(&mut self, tournament: &Tournament) -> CoreResult<()>;

    /// Tournaments passing `filter`, newest start date first
    async fn list_tournaments(
        &mut self,
        filter: &TournamentFilter,
        page: Page,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Tournament>>;

    // Teams

    async fn insert_team(&mut self, team: &Team) -> CoreResult<()>;

    async fn find_team(&mut self, id: TeamId) -> CoreResult<Option<Team>>;

    async fn find_team_by_name(&mut self, name: &str) -> CoreResult<Option<Team>>;

    async fn update_team(&mut self, team: &Team) -> CoreResult<()>;

    /// Teams currently enrolled in a tournament, ordered by name
    async fn list_tournament_teams(&mut self, tournament_id: TournamentId)
    -> CoreResult<Vec<Team>>;

    /// Teams passing `filter`, ordered by name
    async fn list_teams(&mut self, filter: &TeamFilter, page: Page) -> CoreResult<Vec<Team>>;

    // Players

    async fn insert_player(&mut self, player: &Player) -> CoreResult<()>;

    async fn find_player(&mut self, id: PlayerId) -> CoreResult<Option<Player>>;

    async fn find_player_by_username(&mut self, username: &str) -> CoreResult<Option<Player>>;

    async fn find_player_by_user(&mut self, user_id: UserId) -> CoreResult<Option<Player>>;

    async fn update_player(&mut self, player: &Player) -> CoreResult<()>;

    /// Roster of a team, ordered by username
    async fn list_team_players(&mut self, team_id: TeamId) -> CoreResult<Vec<Player>>;

    // Matches

    /// Persist generated matches in one batch
    async fn insert_matches(&mut self, matches: &[Match]) -> CoreResult<()>;

    async fn find_match(&mut self, id: MatchId) -> CoreResult<Option<Match>>;

    async fn update_match(&mut self, game: &Match) -> CoreResult<()>;

    /// Matches of a tournament, earliest start first
    async fn list_tournament_matches(
        &mut self,
        tournament_id: TournamentId,
    ) -> CoreResult<Vec<Match>>;

    /// Matches a team played on either side, earliest start first
    async fn list_team_matches(&mut self, team_id: TeamId) -> CoreResult<Vec<Match>>;

    /// Matches passing `filter`, latest start first
    async fn list_matches(&mut self, filter: &MatchFilter, page: Page) -> CoreResult<Vec<Match>>;

    // Prize cuts

    async fn insert_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()>;

    /// Prize cuts of a tournament, ordered by place
    async fn list_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<Vec<PrizeCut>>;

    async fn update_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()>;

    /// Delete every prize cut of a tournament, returning how many were removed
    async fn delete_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<u64>;

    // Requests

    async fn insert_request(&mut self, request: &Request) -> CoreResult<()>;

    async fn find_request(&mut self, id: RequestId) -> CoreResult<Option<Request>>;

    async fn find_pending_request(&mut self, user_id: UserId) -> CoreResult<Option<Request>>;

    async fn update_request(&mut self, request: &Request) -> CoreResult<()>;

    async fn list_requests(&mut self, filter: &RequestFilter, page: Page)
    -> CoreResult<Vec<Request>>;
}

/// A transaction boundary around a [`Repository`]
///
/// Dropping a unit of work without committing discards its changes.
#[async_trait]
pub trait UnitOfWork: Repository {
    async fn commit(&mut self) -> CoreResult<()>;

    async fn rollback(&mut self) -> CoreResult<()>;
}

/// Source of units of work
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>>;
}

