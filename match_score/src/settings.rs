//! Competition settings handed to the engine at startup.

use crate::constants::{
    DEFAULT_FIRST_MATCH_HOUR, DEFAULT_LAST_MATCH_HOUR, DEFAULT_MATCH_SLOT_MINUTES,
    DEFAULT_MAX_MATCHES_PER_DAY, DEFAULT_MAX_ROSTER_SIZE, DEFAULT_MIN_ROSTER_SIZE,
    DEFAULT_MIN_START_LEAD_HOURS,
};
use crate::error::{CoreError, CoreResult};
use std::env;

/// Scheduling and roster rules for every tournament run by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionSettings {
    /// Hour (UTC) of the first match of each tournament day
    pub first_match_hour: u32,

    /// Matches that would start after this hour move to the next day
    pub last_match_hour: u32,

    /// Minutes between consecutive match start times
    pub match_slot_minutes: i64,

    /// Matches per day assumed when sizing round-robin tournaments
    pub max_matches_per_day: u32,

    /// Players required on each team before a score can be recorded
    pub min_roster_size: usize,

    /// Maximum players on a team
    pub max_roster_size: usize,

    /// Minimum hours between now and a new tournament's start date
    pub min_start_lead_hours: i64,
}

impl CompetitionSettings {
    /// Create settings from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - `FIRST_MATCH_HOUR` (default: 11)
    /// - `LAST_MATCH_HOUR` (default: 18)
    /// - `MATCH_SLOT_MINUTES` (default: 120)
    /// - `MAX_MATCHES_PER_DAY` (default: 4)
    /// - `MIN_ROSTER_SIZE` (default: 5)
    /// - `MAX_ROSTER_SIZE` (default: 10)
    /// - `MIN_START_LEAD_HOURS` (default: 24)
    ///
    /// Unparsable values fall back to the default. Call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        Self {
            first_match_hour: parse_env_or("FIRST_MATCH_HOUR", DEFAULT_FIRST_MATCH_HOUR),
            last_match_hour: parse_env_or("LAST_MATCH_HOUR", DEFAULT_LAST_MATCH_HOUR),
            match_slot_minutes: parse_env_or("MATCH_SLOT_MINUTES", DEFAULT_MATCH_SLOT_MINUTES),
            max_matches_per_day: parse_env_or("MAX_MATCHES_PER_DAY", DEFAULT_MAX_MATCHES_PER_DAY),
            min_roster_size: parse_env_or("MIN_ROSTER_SIZE", DEFAULT_MIN_ROSTER_SIZE),
            max_roster_size: parse_env_or("MAX_ROSTER_SIZE", DEFAULT_MAX_ROSTER_SIZE),
            min_start_lead_hours: parse_env_or(
                "MIN_START_LEAD_HOURS",
                DEFAULT_MIN_START_LEAD_HOURS,
            ),
        }
    }

    /// Check the settings are internally consistent
    pub fn validate(&self) -> CoreResult<()> {
        if self.first_match_hour > 23 || self.last_match_hour > 23 {
            return Err(CoreError::validation("Match hours must be between 0 and 23"));
        }

        if self.last_match_hour < self.first_match_hour {
            return Err(CoreError::validation(
                "Last match hour must not precede the first match hour",
            ));
        }

        if self.match_slot_minutes <= 0 {
            return Err(CoreError::validation("Match slot must be positive"));
        }

        if self.max_matches_per_day == 0 {
            return Err(CoreError::validation("At least one match per day is required"));
        }

        if self.min_roster_size == 0 || self.max_roster_size < self.min_roster_size {
            return Err(CoreError::validation(format!(
                "Roster limits are inconsistent: min {}, max {}",
                self.min_roster_size, self.max_roster_size
            )));
        }

        Ok(())
    }
}

impl Default for CompetitionSettings {
    fn default() -> Self {
        Self {
            first_match_hour: DEFAULT_FIRST_MATCH_HOUR,
            last_match_hour: DEFAULT_LAST_MATCH_HOUR,
            match_slot_minutes: DEFAULT_MATCH_SLOT_MINUTES,
            max_matches_per_day: DEFAULT_MAX_MATCHES_PER_DAY,
            min_roster_size: DEFAULT_MIN_ROSTER_SIZE,
            max_roster_size: DEFAULT_MAX_ROSTER_SIZE,
            min_start_lead_hours: DEFAULT_MIN_START_LEAD_HOURS,
        }
    }
}

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = CompetitionSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.first_match_hour, 11);
        assert_eq!(settings.min_roster_size, 5);
    }

    #[test]
    fn test_rejects_inverted_hours() {
        let settings = CompetitionSettings {
            first_match_hour: 15,
            last_match_hour: 12,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_rejects_zero_matches_per_day() {
        let settings = CompetitionSettings {
            max_matches_per_day: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_inconsistent_roster_limits() {
        let settings = CompetitionSettings {
            min_roster_size: 6,
            max_roster_size: 5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
