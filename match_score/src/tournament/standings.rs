//! Group stage table.

use std::collections::HashMap;

use super::models::Stage;
use crate::constants::POINTS_PER_WIN;
use crate::game::Match;
use crate::team::{Team, TeamId};

/// One row of the group table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub team_id: TeamId,
    pub points: i64,
    pub wins: i64,
    pub score_difference: i64,
    pub total_score: i64,
}

impl Standing {
    fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            points: 0,
            wins: 0,
            score_difference: 0,
            total_score: 0,
        }
    }
}

/// Rank `teams` by their finished group-stage matches
///
/// Ordering is points, then wins, then score difference, then total score,
/// all descending. The sort is stable, so exact ties keep the order of
/// `teams`.
pub fn rank(teams: &[Team], matches: &[Match]) -> Vec<Standing> {
    let mut table: HashMap<TeamId, Standing> =
        teams.iter().map(|t| (t.id, Standing::new(t.id))).collect();

    for game in matches
        .iter()
        .filter(|m| m.is_finished && m.stage == Stage::GroupStage)
    {
        let sides = [
            (game.team1_id, game.team1_score, game.team2_score),
            (game.team2_id, game.team2_score, game.team1_score),
        ];
        for (team_id, own, other) in sides {
            if let Some(row) = table.get_mut(&team_id) {
                if game.winner_team_id == Some(team_id) {
                    row.wins += 1;
                    row.points += POINTS_PER_WIN;
                }
                row.score_difference += i64::from(own - other);
                row.total_score += i64::from(own);
            }
        }
    }

    let mut ranked: Vec<Standing> = teams
        .iter()
        .filter_map(|t| table.remove(&t.id))
        .collect();
    ranked.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.wins.cmp(&a.wins))
            .then(b.score_difference.cmp(&a.score_difference))
            .then(b.total_score.cmp(&a.total_score))
    });
    ranked
}
