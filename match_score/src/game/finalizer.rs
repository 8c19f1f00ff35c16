//! Bookkeeping once a match has a winner.

use log::debug;

use super::models::Match;
use super::scoring::Outcome;
use crate::db::Repository;
use crate::error::{CoreResult, require};
use crate::tournament::{Stage, Tournament, TournamentFormat, prizes};

/// Close `game` with `outcome` and update team and player counters
///
/// Both teams and every rostered player get a played game; the winning team
/// and its players also get a win.
pub async fn mark_finished<R: Repository + ?Sized>(
    repo: &mut R,
    game: &mut Match,
    outcome: &Outcome,
) -> CoreResult<()> {
    game.is_finished = true;
    game.winner_team_id = Some(outcome.winner);
    repo.update_match(game).await?;

    for team_id in [outcome.winner, outcome.loser] {
        let won = team_id == outcome.winner;

        let mut team = require(repo.find_team(team_id).await?, "Team")?;
        team.played_games += 1;
        if won {
            team.won_games += 1;
        }
        repo.update_team(&team).await?;

        for mut player in repo.list_team_players(team_id).await? {
            player.played_games += 1;
            if won {
                player.won_games += 1;
            }
            repo.update_player(&player).await?;
        }
    }

    Ok(())
}

/// Apply the consequences of a finished match to the tournament
///
/// A final pays out the prize cuts. In knock-out formats the loser leaves the
/// tournament right away; round-robin losers stay until the group stage ends.
pub async fn handle_finished<R: Repository + ?Sized>(
    repo: &mut R,
    tournament: &Tournament,
    game: &Match,
    outcome: &Outcome,
) -> CoreResult<()> {
    if game.stage == Stage::Final {
        return prizes::allocate_prizes(repo, tournament.id, outcome).await;
    }

    if tournament.format != TournamentFormat::RoundRobin {
        let mut loser = require(repo.find_team(outcome.loser).await?, "Team")?;
        loser.tournament_id = None;
        repo.update_team(&loser).await?;
        debug!("Team '{}' eliminated from {}", loser.name, tournament.title);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Store};
    use crate::team::{Player, Team, TeamId};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn tournament(format: TournamentFormat, stage: Stage) -> Tournament {
        let start_date = Utc::now() + Duration::days(1);
        Tournament {
            id: Uuid::new_v4(),
            title: "Spring Open".to_string(),
            format,
            start_date,
            end_date: start_date + Duration::days(2),
            prize_pool: 1_000,
            current_stage: stage,
            director_id: Uuid::new_v4(),
        }
    }

    fn player(username: String, team_id: TeamId) -> Player {
        Player {
            id: Uuid::new_v4(),
            username,
            first_name: "Sam".to_string(),
            last_name: "Rowe".to_string(),
            country: "SE".to_string(),
            avatar: None,
            played_games: 0,
            won_games: 0,
            user_id: None,
            team_id: Some(team_id),
        }
    }

    /// Store a tournament with two five-player teams and one match between them
    async fn seed<R: Repository + ?Sized>(
        repo: &mut R,
        tournament: &Tournament,
    ) -> (Team, Team, Match) {
        repo.insert_tournament(tournament).await.unwrap();

        let mut teams = Vec::new();
        for name in ["Falcons", "Wolves"] {
            let mut team = Team::new(name);
            team.tournament_id = Some(tournament.id);
            repo.insert_team(&team).await.unwrap();
            for i in 0..5 {
                let p = player(format!("{}-{i}", name.to_lowercase()), team.id);
                repo.insert_player(&p).await.unwrap();
            }
            teams.push(team);
        }

        let game = Match::scheduled(
            tournament.id,
            tournament.current_stage,
            teams[0].id,
            teams[1].id,
            tournament.start_date,
        );
        repo.insert_matches(std::slice::from_ref(&game)).await.unwrap();

        let wolves = teams.remove(1);
        (teams.remove(0), wolves, game)
    }

    #[tokio::test]
    async fn test_mark_finished_counts_for_both_sides() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let tournament = tournament(TournamentFormat::SingleElimination, Stage::SemiFinal);
        let (falcons, wolves, mut game) = seed(&mut *uow, &tournament).await;

        let outcome = Outcome {
            winner: falcons.id,
            loser: wolves.id,
        };
        mark_finished(&mut *uow, &mut game, &outcome).await.unwrap();

        let stored = uow.find_match(game.id).await.unwrap().unwrap();
        assert!(stored.is_finished);
        assert_eq!(stored.winner_team_id, Some(falcons.id));

        for (team_id, expected) in [(falcons.id, (1, 1)), (wolves.id, (1, 0))] {
            let team = uow.find_team(team_id).await.unwrap().unwrap();
            assert_eq!((team.played_games, team.won_games), expected, "{}", team.name);

            let roster = uow.list_team_players(team_id).await.unwrap();
            assert_eq!(roster.len(), 5);
            for p in roster {
                assert_eq!((p.played_games, p.won_games), expected, "{}", p.username);
            }
        }
    }

    #[tokio::test]
    async fn test_knockout_loser_is_released() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let tournament = tournament(TournamentFormat::SingleElimination, Stage::SemiFinal);
        let (falcons, wolves, game) = seed(&mut *uow, &tournament).await;

        let outcome = Outcome {
            winner: falcons.id,
            loser: wolves.id,
        };
        handle_finished(&mut *uow, &tournament, &game, &outcome)
            .await
            .unwrap();

        assert!(uow.find_team(wolves.id).await.unwrap().unwrap().is_free());
        assert_eq!(
            uow.find_team(falcons.id).await.unwrap().unwrap().tournament_id,
            Some(tournament.id)
        );
    }

    #[tokio::test]
    async fn test_round_robin_loser_stays() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let tournament = tournament(TournamentFormat::RoundRobin, Stage::GroupStage);
        let (falcons, wolves, game) = seed(&mut *uow, &tournament).await;

        let outcome = Outcome {
            winner: falcons.id,
            loser: wolves.id,
        };
        handle_finished(&mut *uow, &tournament, &game, &outcome)
            .await
            .unwrap();

        let wolves = uow.find_team(wolves.id).await.unwrap().unwrap();
        assert_eq!(wolves.tournament_id, Some(tournament.id));
    }
}
