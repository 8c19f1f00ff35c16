//! Team history aggregates.

use std::collections::{HashMap, HashSet};

use super::models::{OpponentRecord, TeamId, TeamStatistics};
use crate::db::Repository;
use crate::error::CoreResult;
use crate::game::Match;
use crate::tournament::{Stage, TournamentId};

/// Whole-percent ratio, `"0%"` when nothing was played
pub fn percent(won: u32, played: u32) -> String {
    if played == 0 {
        return "0%".to_string();
    }
    format!("{:.0}%", f64::from(won) * 100.0 / f64::from(played))
}

/// Per-opponent record over the finished matches of `team_id`, heaviest first
pub fn opponent_records(
    team_id: TeamId,
    matches: &[Match],
    names: &HashMap<TeamId, String>,
) -> Vec<OpponentRecord> {
    let mut records: HashMap<TeamId, OpponentRecord> = HashMap::new();

    for game in matches.iter().filter(|m| m.is_finished && m.involves(team_id)) {
        let opponent_id = if game.team1_id == team_id {
            game.team2_id
        } else {
            game.team1_id
        };
        let record = records.entry(opponent_id).or_insert_with(|| OpponentRecord {
            opponent_id,
            opponent_name: names.get(&opponent_id).cloned().unwrap_or_default(),
            games: 0,
            wins: 0,
            losses: 0,
        });
        record.games += 1;
        if game.winner_team_id == Some(team_id) {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
    }

    let mut records: Vec<OpponentRecord> = records.into_values().collect();
    records.sort_by(|a, b| {
        b.games
            .cmp(&a.games)
            .then_with(|| a.opponent_name.cmp(&b.opponent_name))
    });
    records
}

/// Aggregate statistics of `team_id`
///
/// # Arguments
///
/// * `team_id` - Team being summarized
/// * `matches` - Every match the team appeared in
/// * `finished_tournaments` - Tournaments among those that have finished
/// * `names` - Team names by ID, used for opponents
pub fn compute(
    team_id: TeamId,
    matches: &[Match],
    finished_tournaments: &HashSet<TournamentId>,
    names: &HashMap<TeamId, String>,
) -> TeamStatistics {
    let finished: Vec<&Match> = matches
        .iter()
        .filter(|m| m.is_finished && m.involves(team_id))
        .collect();

    let matches_played = finished.len() as u32;
    let matches_won = finished
        .iter()
        .filter(|m| m.winner_team_id == Some(team_id))
        .count() as u32;

    let tournaments_played = finished
        .iter()
        .map(|m| m.tournament_id)
        .filter(|id| finished_tournaments.contains(id))
        .collect::<HashSet<_>>()
        .len() as u32;
    let tournaments_won = finished
        .iter()
        .filter(|m| m.stage == Stage::Final && m.winner_team_id == Some(team_id))
        .count() as u32;

    let records = opponent_records(team_id, matches, names);
    let best = records
        .iter()
        .filter(|r| r.wins > 0)
        .max_by(|a, b| {
            a.wins
                .cmp(&b.wins)
                .then_with(|| b.opponent_name.cmp(&a.opponent_name))
        });
    let worst = records
        .iter()
        .filter(|r| r.losses > 0)
        .max_by(|a, b| {
            a.losses
                .cmp(&b.losses)
                .then_with(|| b.opponent_name.cmp(&a.opponent_name))
        });

    TeamStatistics {
        tournaments_played,
        tournaments_won,
        matches_played: matches_played as i32,
        matches_won: matches_won as i32,
        match_win_ratio: percent(matches_won, matches_played),
        tournament_win_ratio: percent(tournaments_won, tournaments_played),
        most_often_played_opponent: records.first().map(|r| r.opponent_name.clone()),
        best_opponent: best.map(|r| r.opponent_name.clone()),
        worst_opponent: worst.map(|r| r.opponent_name.clone()),
    }
}

/// Load what [`compute`] needs from the repository
pub async fn team_statistics<R: Repository + ?Sized>(
    repo: &mut R,
    team_id: TeamId,
    matches: &[Match],
) -> CoreResult<TeamStatistics> {
    let mut names = HashMap::new();
    let mut finished_tournaments = HashSet::new();
    let mut seen_tournaments = HashSet::new();

    for game in matches {
        for id in [game.team1_id, game.team2_id] {
            if !names.contains_key(&id) {
                if let Some(team) = repo.find_team(id).await? {
                    names.insert(id, team.name);
                }
            }
        }
        if seen_tournaments.insert(game.tournament_id) {
            if let Some(t) = repo.find_tournament(game.tournament_id).await? {
                if t.current_stage == Stage::Finished {
                    finished_tournaments.insert(t.id);
                }
            }
        }
    }

    Ok(compute(team_id, matches, &finished_tournaments, &names))
}
