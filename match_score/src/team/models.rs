//! Team and player data models.

use crate::auth::UserId;
use crate::game::Match;
use crate::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team ID type
pub type TeamId = Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Team row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub logo: Option<String>,
    pub played_games: i32,
    pub won_games: i32,
    /// `None` while the team is a free agent
    pub tournament_id: Option<TournamentId>,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            logo: None,
            played_games: 0,
            won_games: 0,
            tournament_id: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.tournament_id.is_none()
    }
}

/// Player row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub avatar: Option<String>,
    pub played_games: i32,
    pub won_games: i32,
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

/// Request to create a team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub logo: Option<String>,
}

/// Partial team update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub logo: Option<String>,
}

/// Team listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamFilter {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    /// `Some(true)` keeps free agents, `Some(false)` keeps enrolled teams
    pub is_available: Option<bool>,
}

impl TeamFilter {
    pub fn matches(&self, team: &Team) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .is_none_or(|needle| team.name.to_lowercase().contains(&needle.to_lowercase()));
        let available_ok = self.is_available.is_none_or(|free| team.is_free() == free);
        search_ok && available_ok
    }
}

/// Request to create a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlayer {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub country: String,
    pub avatar: Option<String>,
    pub team_name: Option<String>,
}

/// Partial player update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub team_name: Option<String>,
}

/// Player with the names of what it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDetail {
    pub player: Player,
    pub team_name: Option<String>,
    pub tournament_title: Option<String>,
}

/// Win/loss summary against one opponent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentRecord {
    pub opponent_id: TeamId,
    pub opponent_name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Aggregated team history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStatistics {
    pub tournaments_played: u32,
    pub tournaments_won: u32,
    pub matches_played: i32,
    pub matches_won: i32,
    /// Whole-percent win ratio, e.g. `"67%"`
    pub match_win_ratio: String,
    pub tournament_win_ratio: String,
    pub most_often_played_opponent: Option<String>,
    pub best_opponent: Option<String>,
    pub worst_opponent: Option<String>,
}

/// Team with roster, match history and statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDetail {
    pub team: Team,
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub statistics: TeamStatistics,
}
