//! Tournament manager for creating, updating and browsing tournaments.

use chrono::Utc;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::models::{
    NewTournament, Tournament, TournamentDetail, TournamentFilter, TournamentId, TournamentPatch,
};
use super::pairing::generate_matches;
use super::prizes::{create_prize_cuts, delete_prize_cuts};
use super::rules::{end_date, initial_stage, normalize_start};
use crate::auth::Actor;
use crate::context::EngineContext;
use crate::db::{Page, Repository};
use crate::error::{CoreError, CoreResult, require};
use crate::notify::Outbox;
use crate::team::Team;
use crate::validation::{
    author_of_tournament, director_or_admin, end_date_not_earlier, first_failure, non_empty,
    prize_pool_positive, start_date_lead, tournament_not_finished, tournament_not_started,
    unique_names,
};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    ctx: Arc<EngineContext>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Create a tournament with its teams, prize cuts and opening matches
    ///
    /// Teams are looked up by name: free teams are enrolled, unknown names are
    /// created. Everything happens in one unit of work.
    ///
    /// # Arguments
    ///
    /// * `actor` - Director or admin creating the tournament
    /// * `new` - Tournament definition
    ///
    /// # Returns
    ///
    /// * `CoreResult<Tournament>` - The stored tournament
    pub async fn create_tournament(
        &self,
        actor: &Actor,
        new: NewTournament,
    ) -> CoreResult<Tournament> {
        let mut uow = self.ctx.store.begin().await?;
        let mut outbox = Outbox::new();
        let result = self.create_in(&mut *uow, &mut outbox, actor, new).await;
        let tournament = self.ctx.finish(uow, result).await?;
        self.ctx.deliver(outbox).await;

        info!(
            "Tournament '{}' ({}) created by {}",
            tournament.title, tournament.format, actor.id
        );
        Ok(tournament)
    }

    async fn create_in<R: Repository + ?Sized>(
        &self,
        repo: &mut R,
        outbox: &mut Outbox,
        actor: &Actor,
        new: NewTournament,
    ) -> CoreResult<Tournament> {
        let settings = &self.ctx.settings;
        let now = Utc::now();
        let title = new.title.trim().to_string();

        first_failure([
            director_or_admin(actor),
            non_empty("Title", &title),
            prize_pool_positive(new.prize_pool),
            unique_names(&new.team_names),
            start_date_lead(new.start_date, now, settings.min_start_lead_hours),
        ])?;

        if repo.find_tournament_by_title(&title).await?.is_some() {
            return Err(CoreError::conflict(format!(
                "A tournament with the title '{title}' already exists"
            )));
        }

        let team_count = new.team_names.len();
        let stage = initial_stage(new.format, team_count)?;
        let start_date = normalize_start(new.start_date, settings)?;
        let tournament = Tournament {
            id: Uuid::new_v4(),
            title,
            format: new.format,
            start_date,
            end_date: end_date(start_date, new.format, stage, team_count, settings)?,
            prize_pool: new.prize_pool,
            current_stage: stage,
            director_id: actor.id,
        };
        repo.insert_tournament(&tournament).await?;
        create_prize_cuts(repo, tournament.id, tournament.prize_pool).await?;

        for name in &new.team_names {
            match repo.find_team_by_name(name).await? {
                Some(mut team) => {
                    if !team.is_free() {
                        return Err(CoreError::state(format!(
                            "Team '{name}' is already participating in another tournament"
                        )));
                    }
                    team.tournament_id = Some(tournament.id);
                    repo.update_team(&team).await?;
                }
                None => {
                    non_empty("Team name", name)?;
                    let mut team = Team::new(name.as_str());
                    team.tournament_id = Some(tournament.id);
                    repo.insert_team(&team).await?;
                }
            }
        }

        generate_matches(repo, &self.ctx, &tournament, outbox).await?;
        Ok(tournament)
    }

    /// Update a tournament's title, end date or prize pool
    ///
    /// Directors may only edit their own tournaments before they start;
    /// admins may edit until the tournament finishes. A new prize pool
    /// replaces the prize cuts.
    pub async fn update_tournament(
        &self,
        actor: &Actor,
        tournament_id: TournamentId,
        patch: TournamentPatch,
    ) -> CoreResult<Tournament> {
        let mut uow = self.ctx.store.begin().await?;
        let result = update_in(&mut *uow, actor, tournament_id, patch).await;
        self.ctx.finish(uow, result).await
    }

    /// Tournament with its teams, matches and prize cuts
    pub async fn get_tournament(&self, tournament_id: TournamentId) -> CoreResult<TournamentDetail> {
        let mut uow = self.ctx.store.begin().await?;
        let result = detail_in(&mut *uow, tournament_id).await;
        self.ctx.finish(uow, result).await
    }

    /// Tournaments passing `filter`, newest start date first
    pub async fn list_tournaments(
        &self,
        filter: &TournamentFilter,
        page: Page,
    ) -> CoreResult<Vec<Tournament>> {
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.list_tournaments(filter, page, Utc::now()).await;
        self.ctx.finish(uow, result).await
    }
}

async fn update_in<R: Repository + ?Sized>(
    repo: &mut R,
    actor: &Actor,
    tournament_id: TournamentId,
    patch: TournamentPatch,
) -> CoreResult<Tournament> {
    let now = Utc::now();
    director_or_admin(actor)?;
    let mut tournament = require(repo.find_tournament(tournament_id).await?, "Tournament")?;
    tournament_not_finished(&tournament, now)?;

    if !actor.is_admin() {
        let any_scored = repo
            .list_tournament_matches(tournament.id)
            .await?
            .iter()
            .any(|m| m.team1_score != 0 || m.team2_score != 0);
        first_failure([
            tournament_not_started(&tournament, any_scored, now),
            author_of_tournament(actor, &tournament),
        ])?;
    }

    if let Some(title) = patch.title {
        let title = title.trim().to_string();
        non_empty("Title", &title)?;
        if title != tournament.title {
            if repo.find_tournament_by_title(&title).await?.is_some() {
                return Err(CoreError::conflict(format!(
                    "A tournament with the title '{title}' already exists"
                )));
            }
            tournament.title = title;
        }
    }

    if let Some(end) = patch.end_date {
        end_date_not_earlier(tournament.end_date, end)?;
        tournament.end_date = end;
    }

    if let Some(pool) = patch.prize_pool {
        prize_pool_positive(pool)?;
        if pool != tournament.prize_pool {
            delete_prize_cuts(repo, tournament.id).await?;
            create_prize_cuts(repo, tournament.id, pool).await?;
            tournament.prize_pool = pool;
        }
    }

    repo.update_tournament(&tournament).await?;
    Ok(tournament)
}

async fn detail_in<R: Repository + ?Sized>(
    repo: &mut R,
    tournament_id: TournamentId,
) -> CoreResult<TournamentDetail> {
    let tournament = require(repo.find_tournament(tournament_id).await?, "Tournament")?;
    Ok(TournamentDetail {
        teams: repo.list_tournament_teams(tournament.id).await?,
        matches: repo.list_tournament_matches(tournament.id).await?,
        prize_cuts: repo.list_prize_cuts(tournament.id).await?,
        tournament,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::context::OrderedShuffler;
    use crate::db::MemoryStore;
    use crate::notify::LogNotifier;
    use crate::settings::CompetitionSettings;
    use crate::tournament::{Stage, TournamentFormat};
    use chrono::{Duration, Timelike};

    fn manager() -> TournamentManager {
        let ctx = EngineContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            CompetitionSettings::default(),
        )
        .with_shuffler(Arc::new(OrderedShuffler));
        TournamentManager::new(Arc::new(ctx))
    }

    fn new_tournament(title: &str, format: TournamentFormat, teams: usize) -> NewTournament {
        NewTournament {
            title: title.to_string(),
            format,
            start_date: Utc::now() + Duration::days(3),
            prize_pool: 10_000,
            team_names: (0..teams).map(|i| format!("{title} team {i}")).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_start_and_builds_bracket() {
        let tournaments = manager();
        let director = Actor::new(Uuid::new_v4(), Role::Director);

        let t = tournaments
            .create_tournament(
                &director,
                new_tournament("Quarter Cup", TournamentFormat::SingleElimination, 8),
            )
            .await
            .unwrap();
        assert_eq!(t.current_stage, Stage::QuarterFinal);
        assert_eq!((t.start_date.hour(), t.start_date.minute()), (11, 0));
        assert_eq!(t.director_id, director.id);

        let detail = tournaments.get_tournament(t.id).await.unwrap();
        assert_eq!(detail.teams.len(), 8);
        assert_eq!(detail.matches.len(), 4);
        assert_eq!(detail.prize_cuts.len(), 2);
    }

    #[tokio::test]
    async fn test_plain_user_cannot_create() {
        let tournaments = manager();
        let user = Actor::new(Uuid::new_v4(), Role::User);
        let err = tournaments
            .create_tournament(&user, new_tournament("Cup", TournamentFormat::OneOffMatch, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_start_must_be_a_day_ahead() {
        let tournaments = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let mut new = new_tournament("Cup", TournamentFormat::OneOffMatch, 2);
        new.start_date = Utc::now() + Duration::hours(3);

        assert!(matches!(
            tournaments.create_tournament(&admin, new).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_nothing_behind() {
        let tournaments = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);

        // 16 teams are not a supported bracket
        let err = tournaments
            .create_tournament(
                &admin,
                new_tournament("Big Cup", TournamentFormat::SingleElimination, 16),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let listed = tournaments
            .list_tournaments(&TournamentFilter::default(), Page::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_title_conflicts() {
        let tournaments = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        tournaments
            .create_tournament(&admin, new_tournament("Cup", TournamentFormat::OneOffMatch, 2))
            .await
            .unwrap();

        let mut again = new_tournament("Cup", TournamentFormat::OneOffMatch, 2);
        again.team_names = vec!["Other A".to_string(), "Other B".to_string()];
        assert!(matches!(
            tournaments.create_tournament(&admin, again).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_enrolled_team_cannot_join_second_tournament() {
        let tournaments = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        tournaments
            .create_tournament(&admin, new_tournament("Cup", TournamentFormat::OneOffMatch, 2))
            .await
            .unwrap();

        let mut second = new_tournament("Second Cup", TournamentFormat::OneOffMatch, 2);
        second.team_names[0] = "Cup team 0".to_string();
        assert!(matches!(
            tournaments.create_tournament(&admin, second).await,
            Err(CoreError::State(_))
        ));
    }

    #[tokio::test]
    async fn test_update_prize_pool_recreates_cuts() {
        let tournaments = manager();
        let director = Actor::new(Uuid::new_v4(), Role::Director);
        let t = tournaments
            .create_tournament(&director, new_tournament("Cup", TournamentFormat::OneOffMatch, 2))
            .await
            .unwrap();

        let updated = tournaments
            .update_tournament(
                &director,
                t.id,
                TournamentPatch {
                    prize_pool: Some(2_000),
                    title: Some("Renamed Cup".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed Cup");

        let cuts = tournaments.get_tournament(t.id).await.unwrap().prize_cuts;
        let amounts: Vec<i64> = cuts.iter().map(|c| c.amount).collect();
        assert_eq!(amounts, vec![1_400, 600]);
    }

    #[tokio::test]
    async fn test_update_rejects_earlier_end_and_foreign_director() {
        let tournaments = manager();
        let owner = Actor::new(Uuid::new_v4(), Role::Director);
        let t = tournaments
            .create_tournament(&owner, new_tournament("Cup", TournamentFormat::OneOffMatch, 2))
            .await
            .unwrap();

        let earlier = TournamentPatch {
            end_date: Some(t.end_date - Duration::hours(1)),
            ..Default::default()
        };
        assert!(matches!(
            tournaments.update_tournament(&owner, t.id, earlier).await,
            Err(CoreError::Validation(_))
        ));

        let stranger = Actor::new(Uuid::new_v4(), Role::Director);
        assert!(matches!(
            tournaments
                .update_tournament(&stranger, t.id, TournamentPatch::default())
                .await,
            Err(CoreError::Authorization(_))
        ));
    }
}
