//! In-process store.
//!
//! A unit of work holds the store lock for its whole lifetime and keeps a
//! snapshot of the state taken when it began. Rolling back, or dropping the
//! unit of work without committing, restores that snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::Page;
use super::repository::{Repository, Store, UnitOfWork};
use crate::auth::{User, UserId};
use crate::error::{CoreError, CoreResult};
use crate::game::{Match, MatchFilter, MatchId};
use crate::requests::{Request, RequestFilter, RequestId, RequestStatus, SortOrder};
use crate::team::{Player, PlayerId, Team, TeamFilter, TeamId};
use crate::tournament::{PrizeCut, Tournament, TournamentFilter, TournamentId};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    tournaments: HashMap<TournamentId, Tournament>,
    teams: HashMap<TeamId, Team>,
    players: HashMap<PlayerId, Player>,
    matches: HashMap<MatchId, Match>,
    prize_cuts: HashMap<Uuid, PrizeCut>,
    requests: HashMap<RequestId, Request>,
}

/// Store keeping every entity in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            snapshot: Some(snapshot),
        }))
    }
}

/// Unit of work over a [`MemoryStore`]
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    /// State at `begin`; `None` once committed or rolled back
    snapshot: Option<MemoryState>,
}

impl MemoryUnitOfWork {
    fn state(&mut self) -> CoreResult<&mut MemoryState> {
        if self.snapshot.is_none() {
            return Err(CoreError::state("Unit of work is already closed"));
        }
        Ok(&mut *self.guard)
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl Repository for MemoryUnitOfWork {
    async fn insert_user(&mut self, user: &User) -> CoreResult<()> {
        let state = self.state()?;
        if state.users.values().any(|u| same_text(&u.email, &user.email)) {
            return Err(CoreError::conflict(format!(
                "A user with email '{}' already exists",
                user.email
            )));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&mut self, user_id: UserId) -> CoreResult<Option<User>> {
        Ok(self.state()?.users.get(&user_id).cloned())
    }

    async fn update_user(&mut self, user: &User) -> CoreResult<()> {
        let state = self.state()?;
        let slot = state
            .users
            .get_mut(&user.id)
            .ok_or(CoreError::NotFound("User"))?;
        *slot = user.clone();
        Ok(())
    }

    async fn insert_tournament(&mut self, tournament: &Tournament) -> CoreResult<()> {
        let state = self.state()?;
        if state.tournaments.values().any(|t| t.title == tournament.title) {
            return Err(CoreError::conflict(format!(
                "A tournament with the title '{}' already exists",
                tournament.title
            )));
        }
        state.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn find_tournament(&mut self, id: TournamentId) -> CoreResult<Option<Tournament>> {
        Ok(self.state()?.tournaments.get(&id).cloned())
    }

    async fn find_tournament_by_title(&mut self, title: &str) -> CoreResult<Option<Tournament>> {
        Ok(self
            .state()?
            .tournaments
            .values()
            .find(|t| t.title == title)
            .cloned())
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> CoreResult<()> {
        let state = self.state()?;
        if state
            .tournaments
            .values()
            .any(|t| t.id != tournament.id && t.title == tournament.title)
        {
            return Err(CoreError::conflict(format!(
                "A tournament with the title '{}' already exists",
                tournament.title
            )));
        }
        let slot = state
            .tournaments
            .get_mut(&tournament.id)
            .ok_or(CoreError::NotFound("Tournament"))?;
        *slot = tournament.clone();
        Ok(())
    }

    async fn list_tournaments(
        &mut self,
        filter: &TournamentFilter,
        page: Page,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Tournament>> {
        let mut found: Vec<Tournament> = self
            .state()?
            .tournaments
            .values()
            .filter(|t| filter.matches(t, now))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.title.cmp(&b.title)));
        Ok(page.slice(found))
    }

    async fn insert_team(&mut self, team: &Team) -> CoreResult<()> {
        let state = self.state()?;
        if state.teams.values().any(|t| t.name == team.name) {
            return Err(CoreError::conflict(format!(
                "A team with the name '{}' already exists",
                team.name
            )));
        }
        state.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn find_team(&mut self, id: TeamId) -> CoreResult<Option<Team>> {
        Ok(self.state()?.teams.get(&id).cloned())
    }

    async fn find_team_by_name(&mut self, name: &str) -> CoreResult<Option<Team>> {
        Ok(self
            .state()?
            .teams
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn update_team(&mut self, team: &Team) -> CoreResult<()> {
        let state = self.state()?;
        if state
            .teams
            .values()
            .any(|t| t.id != team.id && t.name == team.name)
        {
            return Err(CoreError::conflict(format!(
                "A team with the name '{}' already exists",
                team.name
            )));
        }
        let slot = state
            .teams
            .get_mut(&team.id)
            .ok_or(CoreError::NotFound("Team"))?;
        *slot = team.clone();
        Ok(())
    }

    async fn list_tournament_teams(
        &mut self,
        tournament_id: TournamentId,
    ) -> CoreResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .state()?
            .teams
            .values()
            .filter(|t| t.tournament_id == Some(tournament_id))
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn list_teams(&mut self, filter: &TeamFilter, page: Page) -> CoreResult<Vec<Team>> {
        let mut teams: Vec<Team> = self
            .state()?
            .teams
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page.slice(teams))
    }

    async fn insert_player(&mut self, player: &Player) -> CoreResult<()> {
        let state = self.state()?;
        if state.players.values().any(|p| p.username == player.username) {
            return Err(CoreError::conflict(format!(
                "A player with the username '{}' already exists",
                player.username
            )));
        }
        state.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn find_player(&mut self, id: PlayerId) -> CoreResult<Option<Player>> {
        Ok(self.state()?.players.get(&id).cloned())
    }

    async fn find_player_by_username(&mut self, username: &str) -> CoreResult<Option<Player>> {
        Ok(self
            .state()?
            .players
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn find_player_by_user(&mut self, user_id: UserId) -> CoreResult<Option<Player>> {
        Ok(self
            .state()?
            .players
            .values()
            .find(|p| p.user_id == Some(user_id))
            .cloned())
    }

    async fn update_player(&mut self, player: &Player) -> CoreResult<()> {
        let state = self.state()?;
        if state
            .players
            .values()
            .any(|p| p.id != player.id && p.username == player.username)
        {
            return Err(CoreError::conflict(format!(
                "A player with the username '{}' already exists",
                player.username
            )));
        }
        let previous = state
            .players
            .get_mut(&player.id)
            .ok_or(CoreError::NotFound("Player"))?;
        let old_username = std::mem::replace(previous, player.clone()).username;

        // Link requests reference players by username
        if old_username != player.username {
            for request in state.requests.values_mut() {
                if request.username.as_deref() == Some(old_username.as_str()) {
                    request.username = Some(player.username.clone());
                }
            }
        }
        Ok(())
    }

    async fn list_team_players(&mut self, team_id: TeamId) -> CoreResult<Vec<Player>> {
        let mut players: Vec<Player> = self
            .state()?
            .players
            .values()
            .filter(|p| p.team_id == Some(team_id))
            .cloned()
            .collect();
        players.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(players)
    }

    async fn insert_matches(&mut self, matches: &[Match]) -> CoreResult<()> {
        let state = self.state()?;
        for game in matches {
            if !state.tournaments.contains_key(&game.tournament_id) {
                return Err(CoreError::NotFound("Tournament"));
            }
            state.matches.insert(game.id, game.clone());
        }
        Ok(())
    }

    async fn find_match(&mut self, id: MatchId) -> CoreResult<Option<Match>> {
        Ok(self.state()?.matches.get(&id).cloned())
    }

    async fn update_match(&mut self, game: &Match) -> CoreResult<()> {
        let state = self.state()?;
        let slot = state
            .matches
            .get_mut(&game.id)
            .ok_or(CoreError::NotFound("Match"))?;
        *slot = game.clone();
        Ok(())
    }

    async fn list_tournament_matches(
        &mut self,
        tournament_id: TournamentId,
    ) -> CoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .state()?
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn list_team_matches(&mut self, team_id: TeamId) -> CoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .state()?
            .matches
            .values()
            .filter(|m| m.involves(team_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn list_matches(&mut self, filter: &MatchFilter, page: Page) -> CoreResult<Vec<Match>> {
        let state = self.state()?;

        let team_id = match filter.team_name.as_deref() {
            Some(name) => match state.teams.values().find(|t| t.name == name) {
                Some(team) => Some(team.id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let title = filter.tournament_title.as_deref().map(str::to_lowercase);

        let mut matches: Vec<Match> = state
            .matches
            .values()
            .filter(|m| filter.stage.is_none_or(|s| s == m.stage))
            .filter(|m| filter.is_finished.is_none_or(|f| f == m.is_finished))
            .filter(|m| team_id.is_none_or(|id| m.involves(id)))
            .filter(|m| {
                title.as_deref().is_none_or(|needle| {
                    state
                        .tournaments
                        .get(&m.tournament_id)
                        .is_some_and(|t| t.title.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(page.slice(matches))
    }

    async fn insert_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()> {
        let state = self.state()?;
        if state
            .prize_cuts
            .values()
            .any(|c| c.tournament_id == cut.tournament_id && c.place == cut.place)
        {
            return Err(CoreError::conflict(format!(
                "Prize cut for place {} already exists",
                cut.place
            )));
        }
        state.prize_cuts.insert(cut.id, cut.clone());
        Ok(())
    }

    async fn list_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<Vec<PrizeCut>> {
        let mut cuts: Vec<PrizeCut> = self
            .state()?
            .prize_cuts
            .values()
            .filter(|c| c.tournament_id == tournament_id)
            .cloned()
            .collect();
        cuts.sort_by_key(|c| c.place);
        Ok(cuts)
    }

    async fn update_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()> {
        let state = self.state()?;
        let slot = state
            .prize_cuts
            .get_mut(&cut.id)
            .ok_or(CoreError::NotFound("Prize cut"))?;
        *slot = cut.clone();
        Ok(())
    }

    async fn delete_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<u64> {
        let state = self.state()?;
        let before = state.prize_cuts.len();
        state
            .prize_cuts
            .retain(|_, c| c.tournament_id != tournament_id);
        Ok((before - state.prize_cuts.len()) as u64)
    }

    async fn insert_request(&mut self, request: &Request) -> CoreResult<()> {
        let state = self.state()?;
        if request.status == RequestStatus::Pending
            && state
                .requests
                .values()
                .any(|r| r.user_id == request.user_id && r.status == RequestStatus::Pending)
        {
            return Err(CoreError::conflict("User already has a pending request"));
        }
        state.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_request(&mut self, id: RequestId) -> CoreResult<Option<Request>> {
        Ok(self.state()?.requests.get(&id).cloned())
    }

    async fn find_pending_request(&mut self, user_id: UserId) -> CoreResult<Option<Request>> {
        Ok(self
            .state()?
            .requests
            .values()
            .find(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
            .cloned())
    }

    async fn update_request(&mut self, request: &Request) -> CoreResult<()> {
        let state = self.state()?;
        let slot = state
            .requests
            .get_mut(&request.id)
            .ok_or(CoreError::NotFound("Request"))?;
        *slot = request.clone();
        Ok(())
    }

    async fn list_requests(
        &mut self,
        filter: &RequestFilter,
        page: Page,
    ) -> CoreResult<Vec<Request>> {
        let mut requests: Vec<Request> = self
            .state()?
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.request_date.cmp(&b.request_date).then(a.id.cmp(&b.id)));
        if filter.order == SortOrder::Desc {
            requests.reverse();
        }
        Ok(page.slice(requests))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(&mut self) -> CoreResult<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| CoreError::state("Unit of work is already closed"))
    }

    async fn rollback(&mut self) -> CoreResult<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| CoreError::state("Unit of work is already closed"))?;
        *self.guard = snapshot;
        Ok(())
    }
}
