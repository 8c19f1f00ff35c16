//! Score increments and win conditions.

use super::models::{Match, MatchFormat, Side};
use crate::team::TeamId;

/// Teams on each end of a decided match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub winner: TeamId,
    pub loser: TeamId,
}

/// Round thresholds of one rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Both teams at or above this score means overtime
    pub overtime_at: i32,
    /// Rounds needed to win in regulation
    pub regulation_win: i32,
    /// Rounds needed to win in overtime
    pub overtime_win: i32,
}

/// Required lead over the opponent in every case
pub const WINNING_MARGIN: i32 = 2;

impl MatchFormat {
    pub fn thresholds(self) -> Thresholds {
        match self {
            MatchFormat::Mr15 => Thresholds {
                overtime_at: 15,
                regulation_win: 16,
                overtime_win: 19,
            },
            MatchFormat::Mr12 => Thresholds {
                overtime_at: 12,
                regulation_win: 13,
                overtime_win: 16,
            },
        }
    }
}

/// Add one round to `side`
pub fn credit_point(game: &mut Match, side: Side) {
    match side {
        Side::Team1 => game.team1_score += 1,
        Side::Team2 => game.team2_score += 1,
    }
}

/// Side that has won under `format` with the given scores, if any
pub fn decide_winner(format: MatchFormat, team1_score: i32, team2_score: i32) -> Option<Side> {
    let t = format.thresholds();
    let target = if team1_score >= t.overtime_at && team2_score >= t.overtime_at {
        t.overtime_win
    } else {
        t.regulation_win
    };

    if team1_score >= target && team1_score - team2_score >= WINNING_MARGIN {
        Some(Side::Team1)
    } else if team2_score >= target && team2_score - team1_score >= WINNING_MARGIN {
        Some(Side::Team2)
    } else {
        None
    }
}

/// Winner and loser of `game` at its current score
pub fn evaluate(game: &Match) -> Option<Outcome> {
    decide_winner(game.match_format, game.team1_score, game.team2_score).map(|side| Outcome {
        winner: game.team_id(side),
        loser: game.team_id(side.opponent()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::Stage;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_mr15_regulation() {
        assert_eq!(decide_winner(MatchFormat::Mr15, 16, 14), Some(Side::Team1));
        assert_eq!(decide_winner(MatchFormat::Mr15, 16, 13), Some(Side::Team1));
        assert_eq!(decide_winner(MatchFormat::Mr15, 15, 13), None);
        assert_eq!(decide_winner(MatchFormat::Mr15, 3, 16), Some(Side::Team2));
    }

    #[test]
    fn test_mr15_overtime() {
        assert_eq!(decide_winner(MatchFormat::Mr15, 16, 15), None);
        assert_eq!(decide_winner(MatchFormat::Mr15, 18, 16), None);
        assert_eq!(decide_winner(MatchFormat::Mr15, 19, 17), Some(Side::Team1));
        assert_eq!(decide_winner(MatchFormat::Mr15, 19, 18), None);
        assert_eq!(decide_winner(MatchFormat::Mr15, 17, 19), Some(Side::Team2));
    }

    #[test]
    fn test_mr12_thresholds() {
        assert_eq!(decide_winner(MatchFormat::Mr12, 13, 11), Some(Side::Team1));
        assert_eq!(decide_winner(MatchFormat::Mr12, 13, 12), None);
        assert_eq!(decide_winner(MatchFormat::Mr12, 15, 13), None);
        assert_eq!(decide_winner(MatchFormat::Mr12, 16, 14), Some(Side::Team1));
        assert_eq!(decide_winner(MatchFormat::Mr12, 0, 13), Some(Side::Team2));
    }

    #[test]
    fn test_credit_point_adds_one() {
        let mut game = Match::scheduled(
            Uuid::new_v4(),
            Stage::GroupStage,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        );
        credit_point(&mut game, Side::Team2);
        credit_point(&mut game, Side::Team2);
        credit_point(&mut game, Side::Team1);
        assert_eq!((game.team1_score, game.team2_score), (1, 2));
    }

    #[test]
    fn test_evaluate_reports_loser() {
        let mut game = Match::scheduled(
            Uuid::new_v4(),
            Stage::GroupStage,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        );
        assert_eq!(evaluate(&game), None);

        game.team2_score = 13;
        let outcome = evaluate(&game).unwrap();
        assert_eq!(outcome.winner, game.team2_id);
        assert_eq!(outcome.loser, game.team1_id);
    }
}
