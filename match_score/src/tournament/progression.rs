//! Moving a tournament to its next stage.

use log::info;

use super::models::{Stage, Tournament, next_stage};
use super::pairing::generate_matches;
use super::standings::rank;
use crate::constants::ROUND_ROBIN_ADVANCING_TEAMS;
use crate::context::EngineContext;
use crate::db::Repository;
use crate::error::{CoreResult, require};
use crate::notify::Outbox;

/// Advance `tournament` when every one of its matches is finished
///
/// A completed group stage first releases every team ranked below the top
/// two. The stage then moves forward and, unless the tournament is finished,
/// the matches of the new stage are generated.
///
/// # Returns
///
/// * `CoreResult<bool>` - Whether the stage changed
pub async fn advance_if_stage_complete<R: Repository + ?Sized>(
    repo: &mut R,
    ctx: &EngineContext,
    tournament: &mut Tournament,
    outbox: &mut Outbox,
) -> CoreResult<bool> {
    if tournament.current_stage == Stage::Finished {
        return Ok(false);
    }

    let matches = repo.list_tournament_matches(tournament.id).await?;
    if matches.is_empty() || matches.iter().any(|m| !m.is_finished) {
        return Ok(false);
    }

    if tournament.current_stage == Stage::GroupStage {
        let teams = repo.list_tournament_teams(tournament.id).await?;
        for standing in rank(&teams, &matches)
            .into_iter()
            .skip(ROUND_ROBIN_ADVANCING_TEAMS)
        {
            let mut team = require(repo.find_team(standing.team_id).await?, "Team")?;
            team.tournament_id = None;
            repo.update_team(&team).await?;
        }
    }

    let previous = tournament.current_stage;
    tournament.current_stage = next_stage(previous);
    repo.update_tournament(tournament).await?;
    info!(
        "Tournament '{}' advanced from {} to {}",
        tournament.title, previous, tournament.current_stage
    );

    if tournament.current_stage != Stage::Finished {
        generate_matches(repo, ctx, tournament, outbox).await?;
    }

    Ok(true)
}
