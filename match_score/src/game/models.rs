//! Match data models.

use crate::tournament::{Stage, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Scoring rule set of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchFormat {
    /// Race to 13, used in group stages
    #[serde(rename = "MR12")]
    Mr12,
    /// Race to 16, used in knock-out stages
    #[serde(rename = "MR15")]
    Mr15,
}

impl MatchFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchFormat::Mr12 => "MR12",
            MatchFormat::Mr15 => "MR15",
        }
    }

    /// Rule set used for matches of `stage`
    pub fn for_stage(stage: Stage) -> Self {
        if stage == Stage::GroupStage {
            MatchFormat::Mr12
        } else {
            MatchFormat::Mr15
        }
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MR12" => Ok(MatchFormat::Mr12),
            "MR15" => Ok(MatchFormat::Mr15),
            other => Err(format!("unknown match format '{other}'")),
        }
    }
}

/// One of the two teams in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Team1,
    Team2,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Team1 => Side::Team2,
            Side::Team2 => Side::Team1,
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team1" => Ok(Side::Team1),
            "team2" => Ok(Side::Team2),
            other => Err(format!("unknown side '{other}', expected team1 or team2")),
        }
    }
}

/// Match row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub match_format: MatchFormat,
    pub start_time: DateTime<Utc>,
    pub is_finished: bool,
    pub stage: Stage,
    pub team1_id: Uuid,
    pub team2_id: Uuid,
    pub team1_score: i32,
    pub team2_score: i32,
    pub winner_team_id: Option<Uuid>,
    pub tournament_id: TournamentId,
}

impl Match {
    /// Create an unplayed match
    pub fn scheduled(
        tournament_id: TournamentId,
        stage: Stage,
        team1_id: Uuid,
        team2_id: Uuid,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_format: MatchFormat::for_stage(stage),
            start_time,
            is_finished: false,
            stage,
            team1_id,
            team2_id,
            team1_score: 0,
            team2_score: 0,
            winner_team_id: None,
            tournament_id,
        }
    }

    pub fn team_id(&self, side: Side) -> Uuid {
        match side {
            Side::Team1 => self.team1_id,
            Side::Team2 => self.team2_id,
        }
    }

    pub fn score(&self, side: Side) -> i32 {
        match side {
            Side::Team1 => self.team1_score,
            Side::Team2 => self.team2_score,
        }
    }

    pub fn involves(&self, team_id: Uuid) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    /// Whether scoring has begun or the scheduled time has passed
    pub fn has_started_at(&self, now: DateTime<Utc>) -> bool {
        self.team1_score > 0 || self.team2_score > 0 || self.start_time < now
    }
}

/// Partial match update; team replacements are given by team name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub stage: Option<Stage>,
    pub team1_name: Option<String>,
    pub team2_name: Option<String>,
}

/// Match listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchFilter {
    /// Case-insensitive substring of the tournament title
    pub tournament_title: Option<String>,
    pub stage: Option<Stage>,
    pub is_finished: Option<bool>,
    /// Exact name of a team on either side
    pub team_name: Option<String>,
}
