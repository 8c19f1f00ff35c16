//! Stage and schedule rules derived from format and team count.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::models::{Stage, TournamentFormat};
use crate::constants::{ONE_OFF_MATCH_TEAMS, ROUND_ROBIN_TEAMS};
use crate::error::{CoreError, CoreResult};
use crate::settings::CompetitionSettings;

/// Accepted single elimination bracket sizes and the stage each opens with
pub const SINGLE_ELIMINATION_BRACKETS: [(usize, Stage); 2] =
    [(4, Stage::SemiFinal), (8, Stage::QuarterFinal)];

/// Stage a new tournament opens with
///
/// # Arguments
///
/// * `format` - Tournament format
/// * `team_count` - Number of enrolled teams
///
/// # Returns
///
/// * `CoreResult<Stage>` - Opening stage, or a validation error when the format
///   does not support `team_count` teams
pub fn initial_stage(format: TournamentFormat, team_count: usize) -> CoreResult<Stage> {
    let stage = match format {
        TournamentFormat::SingleElimination => SINGLE_ELIMINATION_BRACKETS
            .iter()
            .find(|(count, _)| *count == team_count)
            .map(|&(_, stage)| stage),
        TournamentFormat::RoundRobin => {
            ROUND_ROBIN_TEAMS
                .contains(&team_count)
                .then_some(Stage::GroupStage)
        }
        TournamentFormat::OneOffMatch => ONE_OFF_MATCH_TEAMS
            .contains(&team_count)
            .then_some(Stage::Final),
    };

    stage.ok_or_else(|| {
        let allowed: Vec<usize> = match format {
            TournamentFormat::SingleElimination => SINGLE_ELIMINATION_BRACKETS
                .iter()
                .map(|&(count, _)| count)
                .collect(),
            TournamentFormat::RoundRobin => ROUND_ROBIN_TEAMS.to_vec(),
            TournamentFormat::OneOffMatch => ONE_OFF_MATCH_TEAMS.to_vec(),
        };
        CoreError::validation(format!(
            "A {format} tournament needs {allowed:?} teams, got {team_count}"
        ))
    })
}

/// Days reserved for the knock-out stages still ahead of `stage`
pub fn stage_days(stage: Stage) -> i64 {
    match stage {
        Stage::QuarterFinal => 3,
        Stage::SemiFinal => 2,
        Stage::Final => 1,
        Stage::GroupStage | Stage::Finished => 0,
    }
}

/// Number of unordered pairings among `team_count` teams
pub fn pair_count(team_count: usize) -> usize {
    team_count * team_count.saturating_sub(1) / 2
}

/// Last moment of a tournament
///
/// Round robin reserves enough days for every group match at
/// `max_matches_per_day`, plus a day for the final. Other formats reserve
/// [`stage_days`] for the opening stage. The result is the end of that day.
pub fn end_date(
    start: DateTime<Utc>,
    format: TournamentFormat,
    stage: Stage,
    team_count: usize,
    settings: &CompetitionSettings,
) -> CoreResult<DateTime<Utc>> {
    let required_days = if format == TournamentFormat::RoundRobin {
        let group_matches = pair_count(team_count).saturating_sub(1) as i64;
        let per_day = i64::from(settings.max_matches_per_day.max(1));
        (group_matches + per_day - 1) / per_day + 1
    } else {
        stage_days(stage)
    };

    let last_day = (start + Duration::days(required_days)).date_naive();
    at_time(last_day, 23, 59, 59)
}

/// `start` moved to the first match hour of its day
pub fn normalize_start(
    start: DateTime<Utc>,
    settings: &CompetitionSettings,
) -> CoreResult<DateTime<Utc>> {
    at_hour(start.date_naive(), settings.first_match_hour)
}

/// `day` at `hour:00:00` UTC
pub fn at_hour(day: NaiveDate, hour: u32) -> CoreResult<DateTime<Utc>> {
    at_time(day, hour, 0, 0)
}

fn at_time(day: NaiveDate, hour: u32, min: u32, sec: u32) -> CoreResult<DateTime<Utc>> {
    day.and_hms_opt(hour, min, sec)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::validation(format!("Invalid time of day {hour:02}:{min:02}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 10, 11, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_stage_table() {
        use TournamentFormat::*;
        assert_eq!(initial_stage(SingleElimination, 8).unwrap(), Stage::QuarterFinal);
        assert_eq!(initial_stage(SingleElimination, 4).unwrap(), Stage::SemiFinal);
        assert_eq!(initial_stage(RoundRobin, 4).unwrap(), Stage::GroupStage);
        assert_eq!(initial_stage(RoundRobin, 5).unwrap(), Stage::GroupStage);
        assert_eq!(initial_stage(OneOffMatch, 2).unwrap(), Stage::Final);
    }

    #[test]
    fn test_bracket_sizes_match_knockout_rounds() {
        // Each knock-out day halves the field down to the two finalists
        for (count, stage) in SINGLE_ELIMINATION_BRACKETS {
            assert_eq!(initial_stage(TournamentFormat::SingleElimination, count).unwrap(), stage);
            assert_eq!(1usize << stage_days(stage), count, "{count} teams open at {stage:?}");
        }
    }

    #[test]
    fn test_initial_stage_rejects_other_counts() {
        use TournamentFormat::*;
        for (format, count) in [
            (SingleElimination, 16),
            (SingleElimination, 6),
            (RoundRobin, 3),
            (RoundRobin, 6),
            (OneOffMatch, 4),
        ] {
            assert!(
                matches!(initial_stage(format, count), Err(CoreError::Validation(_))),
                "{format} with {count} teams should be rejected"
            );
        }
    }

    #[test]
    fn test_end_date_round_robin() {
        let settings = CompetitionSettings::default();

        // 6 group matches: ceil(5 / 4) + 1 = 3 days
        let end = end_date(start(), TournamentFormat::RoundRobin, Stage::GroupStage, 4, &settings)
            .unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2030, 5, 13, 23, 59, 59).unwrap());

        // 10 group matches: ceil(9 / 4) + 1 = 4 days
        let end = end_date(start(), TournamentFormat::RoundRobin, Stage::GroupStage, 5, &settings)
            .unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2030, 5, 14, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_end_date_knockout() {
        let settings = CompetitionSettings::default();
        let cases = [
            (TournamentFormat::SingleElimination, Stage::QuarterFinal, 8, 13),
            (TournamentFormat::SingleElimination, Stage::SemiFinal, 4, 12),
            (TournamentFormat::OneOffMatch, Stage::Final, 2, 11),
        ];
        for (format, stage, teams, day) in cases {
            let end = end_date(start(), format, stage, teams, &settings).unwrap();
            assert_eq!(end, Utc.with_ymd_and_hms(2030, 5, day, 23, 59, 59).unwrap());
        }
    }

    #[test]
    fn test_normalize_start() {
        let settings = CompetitionSettings::default();
        let raw = Utc.with_ymd_and_hms(2030, 5, 10, 8, 42, 17).unwrap();
        let normalized = normalize_start(raw, &settings).unwrap();
        assert_eq!(normalized.hour(), 11);
        assert_eq!(normalized.minute(), 0);
        assert_eq!(normalized.date_naive(), raw.date_naive());
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(pair_count(4), 6);
        assert_eq!(pair_count(5), 10);
        assert_eq!(pair_count(0), 0);
    }
}
