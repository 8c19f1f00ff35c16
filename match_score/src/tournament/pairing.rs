//! Pairings and match schedule for a tournament stage.

use chrono::{DateTime, Duration, Timelike, Utc};
use log::debug;
use std::collections::HashMap;

use super::models::{Stage, Tournament, TournamentFormat};
use super::rules::{at_hour, stage_days};
use crate::constants::NOTIFICATION_TIME_FORMAT;
use crate::context::EngineContext;
use crate::db::Repository;
use crate::error::{CoreError, CoreResult};
use crate::game::Match;
use crate::notify::Outbox;
use crate::settings::CompetitionSettings;
use crate::team::{Team, TeamId, linked_emails};

/// Every unordered pair, outer index before inner index
pub fn round_robin_pairs(teams: &[Team]) -> Vec<(TeamId, TeamId)> {
    let mut pairs = Vec::with_capacity(teams.len() * teams.len().saturating_sub(1) / 2);
    for (i, first) in teams.iter().enumerate() {
        for second in &teams[i + 1..] {
            pairs.push((first.id, second.id));
        }
    }
    pairs
}

/// Adjacent teams paired off: (0, 1), (2, 3), ...
pub fn elimination_pairs(teams: &[Team]) -> CoreResult<Vec<(TeamId, TeamId)>> {
    if teams.len() % 2 != 0 {
        return Err(CoreError::state(format!(
            "Cannot pair an odd number of teams ({})",
            teams.len()
        )));
    }
    Ok(teams
        .chunks_exact(2)
        .map(|pair| (pair[0].id, pair[1].id))
        .collect())
}

/// Start of the first match of the tournament's current stage
///
/// Group stages start on the tournament's first day. Knock-out stages count
/// back from the end date by the days still reserved for them.
pub fn first_match_time(
    tournament: &Tournament,
    settings: &CompetitionSettings,
) -> CoreResult<DateTime<Utc>> {
    let day = if is_group_round(tournament) {
        tournament.start_date.date_naive()
    } else {
        (tournament.end_date - Duration::days(stage_days(tournament.current_stage))).date_naive()
    };
    at_hour(day, settings.first_match_hour)
}

/// Start times for `count` consecutive matches beginning at `first`
///
/// A match that would start after the last match hour moves to the next day
/// at the first match hour.
pub fn schedule(
    first: DateTime<Utc>,
    count: usize,
    settings: &CompetitionSettings,
) -> CoreResult<Vec<DateTime<Utc>>> {
    let slot = Duration::minutes(settings.match_slot_minutes);
    let mut clock = first;
    let mut times = Vec::with_capacity(count);

    for _ in 0..count {
        if clock.hour() > settings.last_match_hour {
            let next_day = clock.date_naive() + Duration::days(1);
            clock = at_hour(next_day, settings.first_match_hour)?;
        }
        times.push(clock);
        clock += slot;
    }

    Ok(times)
}

fn is_group_round(tournament: &Tournament) -> bool {
    tournament.format == TournamentFormat::RoundRobin
        && tournament.current_stage == Stage::GroupStage
}

/// Create and persist the matches of the tournament's current stage
///
/// Teams are loaded in name order. Group rounds pair everyone with everyone;
/// other stages shuffle the teams first and pair neighbours. Linked players of
/// both sides get a "Match Created" notification queued in `outbox`.
///
/// # Returns
///
/// * `CoreResult<Vec<Match>>` - The created matches in schedule order
pub async fn generate_matches<R: Repository + ?Sized>(
    repo: &mut R,
    ctx: &EngineContext,
    tournament: &Tournament,
    outbox: &mut Outbox,
) -> CoreResult<Vec<Match>> {
    let mut teams = repo.list_tournament_teams(tournament.id).await?;
    if teams.len() < 2 {
        return Err(CoreError::state(format!(
            "Tournament '{}' has {} team(s) left, at least 2 are needed to pair",
            tournament.title,
            teams.len()
        )));
    }

    let pairs = if is_group_round(tournament) {
        round_robin_pairs(&teams)
    } else {
        ctx.shuffler.shuffle(&mut teams);
        elimination_pairs(&teams)?
    };

    let first = first_match_time(tournament, &ctx.settings)?;
    let times = schedule(first, pairs.len(), &ctx.settings)?;

    let matches: Vec<Match> = pairs
        .iter()
        .zip(times)
        .map(|(&(team1, team2), start)| {
            Match::scheduled(tournament.id, tournament.current_stage, team1, team2, start)
        })
        .collect();

    repo.insert_matches(&matches).await?;

    let names: HashMap<TeamId, &str> = teams.iter().map(|t| (t.id, t.name.as_str())).collect();
    for game in &matches {
        let when = game.start_time.format(NOTIFICATION_TIME_FORMAT).to_string();
        for (team, opponent) in [
            (game.team1_id, game.team2_id),
            (game.team2_id, game.team1_id),
        ] {
            let opponent_name = names.get(&opponent).copied().unwrap_or_default();
            let message = format!(
                "Your match for the '{}' tournament has been scheduled. \
                 You will be playing against {} on {}.",
                tournament.title, opponent_name, when
            );
            for email in linked_emails(repo, team).await? {
                outbox.push(email, "Match Created", message.clone());
            }
        }
    }

    debug!(
        "Generated {} {} match(es) for tournament {}",
        matches.len(),
        tournament.current_stage,
        tournament.id
    );

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn teams(n: usize) -> Vec<Team> {
        (0..n).map(|i| Team::new(format!("Team {i}"))).collect()
    }

    fn tournament(format: TournamentFormat, stage: Stage) -> Tournament {
        Tournament {
            id: Uuid::new_v4(),
            title: "Cup".to_string(),
            format,
            start_date: Utc.with_ymd_and_hms(2030, 5, 10, 11, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2030, 5, 13, 23, 59, 59).unwrap(),
            prize_pool: 1_000,
            current_stage: stage,
            director_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_round_robin_covers_every_pair_once() {
        let teams = teams(5);
        let pairs = round_robin_pairs(&teams);
        assert_eq!(pairs.len(), 10);

        let unique: HashSet<_> = pairs
            .iter()
            .map(|&(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        assert_eq!(unique.len(), 10);
        assert!(pairs.iter().all(|(a, b)| a != b));

        // outer-then-inner order
        assert_eq!(pairs[0], (teams[0].id, teams[1].id));
        assert_eq!(pairs[3], (teams[0].id, teams[4].id));
        assert_eq!(pairs[4], (teams[1].id, teams[2].id));
    }

    #[test]
    fn test_elimination_pairs_are_disjoint() {
        let teams = teams(8);
        let pairs = elimination_pairs(&teams).unwrap();
        assert_eq!(pairs.len(), 4);

        let seen: HashSet<_> = pairs.iter().flat_map(|&(a, b)| [a, b]).collect();
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn test_elimination_rejects_odd_count() {
        assert!(matches!(
            elimination_pairs(&teams(3)),
            Err(CoreError::State(_))
        ));
    }

    #[test]
    fn test_schedule_rolls_over_after_last_hour() {
        let settings = CompetitionSettings::default();
        let first = Utc.with_ymd_and_hms(2030, 5, 10, 11, 0, 0).unwrap();
        let times = schedule(first, 6, &settings).unwrap();

        let hours: Vec<(u32, u32)> = times.iter().map(|t| (t.day(), t.hour())).collect();
        assert_eq!(
            hours,
            vec![(10, 11), (10, 13), (10, 15), (10, 17), (11, 11), (11, 13)]
        );
    }

    #[test]
    fn test_first_match_time() {
        let settings = CompetitionSettings::default();

        let group = tournament(TournamentFormat::RoundRobin, Stage::GroupStage);
        assert_eq!(
            first_match_time(&group, &settings).unwrap(),
            Utc.with_ymd_and_hms(2030, 5, 10, 11, 0, 0).unwrap()
        );

        // Round-robin final goes on the last day
        let final_round = tournament(TournamentFormat::RoundRobin, Stage::Final);
        assert_eq!(
            first_match_time(&final_round, &settings).unwrap(),
            Utc.with_ymd_and_hms(2030, 5, 12, 11, 0, 0).unwrap()
        );

        let semis = tournament(TournamentFormat::SingleElimination, Stage::SemiFinal);
        assert_eq!(
            first_match_time(&semis, &settings).unwrap(),
            Utc.with_ymd_and_hms(2030, 5, 11, 11, 0, 0).unwrap()
        );
    }
}
