//! Default values for competition scheduling and roster rules.

/// Hour (UTC) at which a tournament day starts and the first match is played
pub const DEFAULT_FIRST_MATCH_HOUR: u32 = 11;

/// A match scheduled after this hour (UTC) rolls over to the next day
pub const DEFAULT_LAST_MATCH_HOUR: u32 = 18;

/// Minutes reserved per match, including the buffer before the next one
pub const DEFAULT_MATCH_SLOT_MINUTES: i64 = 120;

/// Matches that fit in one tournament day
pub const DEFAULT_MAX_MATCHES_PER_DAY: u32 = 4;

/// Players a team needs before its matches can be scored
pub const DEFAULT_MIN_ROSTER_SIZE: usize = 5;

/// Maximum players on one team
pub const DEFAULT_MAX_ROSTER_SIZE: usize = 10;

/// Minimum lead time between creating a tournament and its start
pub const DEFAULT_MIN_START_LEAD_HOURS: i64 = 24;

/// Team counts accepted per tournament format
pub const ROUND_ROBIN_TEAMS: [usize; 2] = [4, 5];
pub const ONE_OFF_MATCH_TEAMS: [usize; 1] = [2];

/// Teams that survive the round-robin group stage
pub const ROUND_ROBIN_ADVANCING_TEAMS: usize = 2;

/// Points awarded for a group-stage win
pub const POINTS_PER_WIN: i64 = 2;

/// Display format for match start times in notifications
pub const NOTIFICATION_TIME_FORMAT: &str = "%B %d, %Y at %H:%M";
