//! Authorization and precondition checks.
//!
//! Each check is a pure function returning `CoreResult<()>`. Operations list
//! their checks in order and [`first_failure`] reports the first one that
//! fails.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::auth::{Actor, Role};
use crate::error::{CoreError, CoreResult};
use crate::game::Match;
use crate::requests::Request;
use crate::team::Player;
use crate::tournament::Tournament;

/// Return the first failed check, or `Ok(())` if all pass
pub fn first_failure(checks: impl IntoIterator<Item = CoreResult<()>>) -> CoreResult<()> {
    checks.into_iter().collect()
}

pub fn director_or_admin(actor: &Actor) -> CoreResult<()> {
    match actor.role {
        Role::Admin | Role::Director => Ok(()),
        _ => Err(CoreError::forbidden()),
    }
}

pub fn admin_only(actor: &Actor) -> CoreResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::forbidden())
    }
}

/// Only accounts without an elevated role may file requests
pub fn plain_user_only(actor: &Actor) -> CoreResult<()> {
    if actor.role == Role::User {
        Ok(())
    } else {
        Err(CoreError::Authorization(format!(
            "Only users can send requests, your role is {}",
            actor.role
        )))
    }
}

/// Directors may only touch their own tournaments. Admins pass.
pub fn author_of_tournament(actor: &Actor, tournament: &Tournament) -> CoreResult<()> {
    if actor.is_director() && tournament.director_id != actor.id {
        return Err(CoreError::Authorization(
            "You are not the director of this tournament".to_string(),
        ));
    }
    Ok(())
}

pub fn match_not_finished(game: &Match) -> CoreResult<()> {
    if game.is_finished {
        Err(CoreError::state("Match is already finished"))
    } else {
        Ok(())
    }
}

pub fn match_not_started(game: &Match, now: DateTime<Utc>) -> CoreResult<()> {
    if game.has_started_at(now) {
        Err(CoreError::state("Match has already started"))
    } else {
        Ok(())
    }
}

pub fn roster_complete(team_name: &str, roster: usize, min: usize) -> CoreResult<()> {
    if roster < min {
        Err(CoreError::state(format!(
            "Team '{team_name}' must have at least {min} players, it has {roster}"
        )))
    } else {
        Ok(())
    }
}

pub fn roster_has_space(team_name: &str, roster: usize, max: usize) -> CoreResult<()> {
    if roster >= max {
        Err(CoreError::validation(format!(
            "Team '{team_name}' already has the maximum of {max} players"
        )))
    } else {
        Ok(())
    }
}

pub fn tournament_not_finished(tournament: &Tournament, now: DateTime<Utc>) -> CoreResult<()> {
    if tournament.is_finished_at(now) {
        Err(CoreError::state("Tournament is already finished"))
    } else {
        Ok(())
    }
}

/// A tournament has started once its start date passed or any match was scored
pub fn tournament_not_started(
    tournament: &Tournament,
    any_match_scored: bool,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if tournament.start_date < now || any_match_scored {
        Err(CoreError::state("Tournament has already started"))
    } else {
        Ok(())
    }
}

pub fn start_date_lead(
    start: DateTime<Utc>,
    now: DateTime<Utc>,
    lead_hours: i64,
) -> CoreResult<()> {
    if start < now + Duration::hours(lead_hours) {
        Err(CoreError::validation(format!(
            "Start date must be at least {lead_hours} hours from now"
        )))
    } else {
        Ok(())
    }
}

pub fn end_date_not_earlier(current: DateTime<Utc>, proposed: DateTime<Utc>) -> CoreResult<()> {
    if proposed < current {
        Err(CoreError::validation(
            "End date cannot be earlier than the current end date",
        ))
    } else {
        Ok(())
    }
}

pub fn unique_names(names: &[String]) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(CoreError::validation(format!(
                "Team name '{name}' is listed more than once"
            )));
        }
    }
    Ok(())
}

pub fn non_empty(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        Err(CoreError::validation(format!("{field} cannot be empty")))
    } else {
        Ok(())
    }
}

pub fn prize_pool_positive(pool: i64) -> CoreResult<()> {
    if pool < 1 {
        Err(CoreError::validation("Prize pool must be at least 1"))
    } else {
        Ok(())
    }
}

pub fn request_not_answered(request: &Request) -> CoreResult<()> {
    if request.response_date.is_some() {
        Err(CoreError::state("Request has already been answered"))
    } else {
        Ok(())
    }
}

pub fn player_not_linked(player: &Player) -> CoreResult<()> {
    if player.user_id.is_some() {
        Err(CoreError::conflict(format!(
            "Player '{}' is already linked to a user",
            player.username
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{Decision, RequestType};
    use crate::tournament::{Stage, TournamentFormat};
    use uuid::Uuid;

    fn tournament(director_id: Uuid, start_in_days: i64) -> Tournament {
        let start = Utc::now() + Duration::days(start_in_days);
        Tournament {
            id: Uuid::new_v4(),
            title: "Cup".to_string(),
            format: TournamentFormat::SingleElimination,
            start_date: start,
            end_date: start + Duration::days(2),
            prize_pool: 100,
            current_stage: Stage::SemiFinal,
            director_id,
        }
    }

    #[test]
    fn test_first_failure_keeps_order() {
        let result = first_failure([
            Ok(()),
            Err(CoreError::NotFound("Match")),
            Err(CoreError::forbidden()),
        ]);
        assert!(matches!(result, Err(CoreError::NotFound("Match"))));
        assert!(first_failure([Ok(()), Ok(())]).is_ok());
    }

    #[test]
    fn test_roles() {
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let director = Actor::new(Uuid::new_v4(), Role::Director);
        let user = Actor::new(Uuid::new_v4(), Role::User);
        let player = Actor::new(Uuid::new_v4(), Role::Player);

        assert!(director_or_admin(&admin).is_ok());
        assert!(director_or_admin(&director).is_ok());
        assert!(director_or_admin(&user).is_err());
        assert!(admin_only(&director).is_err());
        assert!(plain_user_only(&user).is_ok());
        assert!(matches!(
            plain_user_only(&player),
            Err(CoreError::Authorization(_))
        ));
    }

    #[test]
    fn test_author_check_only_binds_directors() {
        let owner = Actor::new(Uuid::new_v4(), Role::Director);
        let other = Actor::new(Uuid::new_v4(), Role::Director);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let t = tournament(owner.id, 3);

        assert!(author_of_tournament(&owner, &t).is_ok());
        assert!(author_of_tournament(&other, &t).is_err());
        assert!(author_of_tournament(&admin, &t).is_ok());
    }

    #[test]
    fn test_tournament_started_by_score_or_clock() {
        let now = Utc::now();
        let upcoming = tournament(Uuid::new_v4(), 3);
        assert!(tournament_not_started(&upcoming, false, now).is_ok());
        assert!(tournament_not_started(&upcoming, true, now).is_err());

        let running = tournament(Uuid::new_v4(), -1);
        assert!(matches!(
            tournament_not_started(&running, false, now),
            Err(CoreError::State(_))
        ));
    }

    #[test]
    fn test_start_date_lead() {
        let now = Utc::now();
        assert!(start_date_lead(now + Duration::hours(25), now, 24).is_ok());
        assert!(start_date_lead(now + Duration::hours(2), now, 24).is_err());
    }

    #[test]
    fn test_unique_names() {
        let ok = vec!["A".to_string(), "B".to_string()];
        let dup = vec!["A".to_string(), "A".to_string()];
        assert!(unique_names(&ok).is_ok());
        assert!(unique_names(&dup).is_err());
    }

    #[test]
    fn test_roster_limits() {
        assert!(roster_complete("Falcons", 5, 5).is_ok());
        assert!(matches!(
            roster_complete("Falcons", 4, 5),
            Err(CoreError::State(_))
        ));
        assert!(roster_has_space("Falcons", 9, 10).is_ok());
        assert!(roster_has_space("Falcons", 10, 10).is_err());
    }

    #[test]
    fn test_request_answered_once() {
        let mut request = Request::pending(Uuid::new_v4(), RequestType::PromoteUserToDirector, None);
        assert!(request_not_answered(&request).is_ok());

        request.answer(Uuid::new_v4(), Decision::Accept, Utc::now());
        assert!(request_not_answered(&request).is_err());
    }

    #[test]
    fn test_text_and_pool_checks() {
        assert!(non_empty("Title", "  ").is_err());
        assert!(non_empty("Title", "Cup").is_ok());
        assert!(prize_pool_positive(0).is_err());
        assert!(prize_pool_positive(1).is_ok());
        assert!(end_date_not_earlier(Utc::now(), Utc::now() - Duration::days(1)).is_err());
    }
}
