//! Tournament data models.

use crate::auth::UserId;
use crate::game::Match;
use crate::team::Team;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Overall tournament structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Knock-out bracket, losers leave after every match
    SingleElimination,
    /// Every team meets every other team, top two play the final
    RoundRobin,
    /// Two teams, a single final
    OneOffMatch,
}

impl TournamentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination => "single elimination",
            TournamentFormat::RoundRobin => "round robin",
            TournamentFormat::OneOffMatch => "one off match",
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single elimination" => Ok(TournamentFormat::SingleElimination),
            "round robin" => Ok(TournamentFormat::RoundRobin),
            "one off match" => Ok(TournamentFormat::OneOffMatch),
            other => Err(format!("unknown tournament format '{other}'")),
        }
    }
}

/// Bracket phase of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GroupStage,
    QuarterFinal,
    SemiFinal,
    Final,
    Finished,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::GroupStage => "group stage",
            Stage::QuarterFinal => "quarter final",
            Stage::SemiFinal => "semi final",
            Stage::Final => "final",
            Stage::Finished => "finished",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group stage" => Ok(Stage::GroupStage),
            "quarter final" => Ok(Stage::QuarterFinal),
            "semi final" => Ok(Stage::SemiFinal),
            "final" => Ok(Stage::Final),
            "finished" => Ok(Stage::Finished),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Stage that follows `stage`. Stages never move backwards.
pub fn next_stage(stage: Stage) -> Stage {
    match stage {
        Stage::GroupStage => Stage::Final,
        Stage::QuarterFinal => Stage::SemiFinal,
        Stage::SemiFinal => Stage::Final,
        Stage::Final | Stage::Finished => Stage::Finished,
    }
}

/// Tournament row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub title: String,
    pub format: TournamentFormat,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub prize_pool: i64,
    pub current_stage: Stage,
    pub director_id: UserId,
}

impl Tournament {
    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        self.current_stage == Stage::Finished || self.end_date < now
    }
}

/// Request to create a tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTournament {
    pub title: String,
    pub format: TournamentFormat,
    pub start_date: DateTime<Utc>,
    pub prize_pool: i64,
    /// Existing free teams are enrolled, unknown names are created
    pub team_names: Vec<String>,
}

/// Partial tournament update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentPatch {
    pub title: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
    pub prize_pool: Option<i64>,
}

/// Share of the prize pool awarded to a finishing place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeCut {
    pub id: Uuid,
    pub place: i32,
    pub amount: i64,
    pub tournament_id: TournamentId,
    pub team_id: Option<Uuid>,
}

/// Time window filter for tournament listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Past,
    Present,
    Future,
}

/// Lifecycle filter for tournament listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Active,
    Finished,
}

/// Tournament listing filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TournamentFilter {
    pub period: Option<Period>,
    pub status: Option<TournamentStatus>,
    pub format: Option<TournamentFormat>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub director_id: Option<UserId>,
}

impl TournamentFilter {
    /// Whether `tournament` passes every filter at time `now`
    pub fn matches(&self, tournament: &Tournament, now: DateTime<Utc>) -> bool {
        let finished = tournament.current_stage == Stage::Finished;

        let period_ok = match self.period {
            None => true,
            Some(Period::Past) => tournament.end_date < now || finished,
            Some(Period::Present) => {
                tournament.start_date <= now && tournament.end_date >= now && !finished
            }
            Some(Period::Future) => tournament.start_date > now && !finished,
        };

        let status_ok = match self.status {
            None => true,
            Some(TournamentStatus::Active) => !finished,
            Some(TournamentStatus::Finished) => finished,
        };

        let format_ok = self.format.is_none_or(|f| f == tournament.format);

        let search_ok = self.search.as_deref().is_none_or(|needle| {
            tournament
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });

        let director_ok = self.director_id.is_none_or(|d| d == tournament.director_id);

        period_ok && status_ok && format_ok && search_ok && director_ok
    }
}

/// Tournament with everything it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDetail {
    pub tournament: Tournament,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
    pub prize_cuts: Vec<PrizeCut>,
}
