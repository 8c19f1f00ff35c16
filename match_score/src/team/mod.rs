//! Teams, players and team statistics.

pub mod manager;
pub mod models;
pub mod players;
pub mod statistics;

pub use manager::TeamManager;
pub use models::{
    NewPlayer, NewTeam, OpponentRecord, Player, PlayerDetail, PlayerId, PlayerPatch, Team,
    TeamDetail, TeamFilter, TeamId, TeamPatch, TeamStatistics,
};
pub use players::PlayerManager;

use crate::db::Repository;
use crate::error::CoreResult;

/// Email addresses of the team's players that are linked to a user
pub async fn linked_emails<R: Repository + ?Sized>(
    repo: &mut R,
    team_id: TeamId,
) -> CoreResult<Vec<String>> {
    let mut emails = Vec::new();
    for player in repo.list_team_players(team_id).await? {
        if let Some(user_id) = player.user_id {
            if let Some(user) = repo.find_user(user_id).await? {
                emails.push(user.email);
            }
        }
    }
    Ok(emails)
}
