//! Prize pool split and payout.

use log::info;
use uuid::Uuid;

use super::models::{PrizeCut, TournamentId};
use crate::db::Repository;
use crate::error::{CoreError, CoreResult, require};
use crate::game::Outcome;

/// Shares of the pool paid to first and second place
const FINALIST_SHARES: [f64; 2] = [0.7, 0.3];

/// Payouts per finishing place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeStructure {
    /// Total prize pool
    pub total_pool: i64,
    /// Payouts by place (1st, 2nd)
    pub payouts: Vec<i64>,
}

impl PrizeStructure {
    /// 70/30 split between the two finalists
    ///
    /// Each share is rounded on its own, half to even, so the payouts can
    /// differ from the pool by one.
    pub fn finalists(total_pool: i64) -> Self {
        let payouts = FINALIST_SHARES
            .iter()
            .map(|share| (share * total_pool as f64).round_ties_even() as i64)
            .collect();
        Self {
            total_pool,
            payouts,
        }
    }
}

/// Insert the place 1 and place 2 cuts for a tournament
pub async fn create_prize_cuts<R: Repository + ?Sized>(
    repo: &mut R,
    tournament_id: TournamentId,
    prize_pool: i64,
) -> CoreResult<Vec<PrizeCut>> {
    let structure = PrizeStructure::finalists(prize_pool);
    let mut cuts = Vec::with_capacity(structure.payouts.len());

    for (place, amount) in (1..).zip(structure.payouts) {
        let cut = PrizeCut {
            id: Uuid::new_v4(),
            place,
            amount,
            tournament_id,
            team_id: None,
        };
        repo.insert_prize_cut(&cut).await?;
        cuts.push(cut);
    }

    Ok(cuts)
}

/// Remove every cut of a tournament
pub async fn delete_prize_cuts<R: Repository + ?Sized>(
    repo: &mut R,
    tournament_id: TournamentId,
) -> CoreResult<u64> {
    repo.delete_prize_cuts(tournament_id).await
}

/// Award place 1 to the final's winner and place 2 to its loser
///
/// Both finalists are released from the tournament afterwards. Other places
/// are left as they are.
pub async fn allocate_prizes<R: Repository + ?Sized>(
    repo: &mut R,
    tournament_id: TournamentId,
    outcome: &Outcome,
) -> CoreResult<()> {
    let cuts = repo.list_prize_cuts(tournament_id).await?;

    for (place, team_id) in [(1, outcome.winner), (2, outcome.loser)] {
        let mut cut = cuts
            .iter()
            .find(|c| c.place == place)
            .cloned()
            .ok_or_else(|| {
                CoreError::state(format!("Tournament has no prize cut for place {place}"))
            })?;
        cut.team_id = Some(team_id);
        repo.update_prize_cut(&cut).await?;

        let mut team = require(repo.find_team(team_id).await?, "Team")?;
        team.tournament_id = None;
        repo.update_team(&team).await?;

        info!(
            "Place {} of tournament {} ({}) goes to '{}'",
            place, tournament_id, cut.amount, team.name
        );
    }

    Ok(())
}
