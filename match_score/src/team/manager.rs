//! Team manager.

use log::info;
use std::sync::Arc;

use super::models::{NewTeam, Team, TeamDetail, TeamFilter, TeamId, TeamPatch};
use super::statistics::team_statistics;
use crate::auth::Actor;
use crate::context::EngineContext;
use crate::db::{Page, Repository};
use crate::error::{CoreError, CoreResult, require};
use crate::validation::{director_or_admin, first_failure, non_empty};

/// Team manager
#[derive(Clone)]
pub struct TeamManager {
    ctx: Arc<EngineContext>,
}

impl TeamManager {
    /// Create a new team manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Register a free-agent team
    ///
    /// # Arguments
    ///
    /// * `actor` - Director or admin
    /// * `new` - Team name and optional logo
    ///
    /// # Returns
    ///
    /// * `CoreResult<Team>` - The stored team, `Conflict` if the name is taken
    pub async fn create_team(&self, actor: &Actor, new: NewTeam) -> CoreResult<Team> {
        let mut uow = self.ctx.store.begin().await?;
        let result = create_in(&mut *uow, actor, new).await;
        let team = self.ctx.finish(uow, result).await?;
        info!("Team '{}' created by {}", team.name, actor.id);
        Ok(team)
    }

    /// Rename a team or change its logo
    pub async fn update_team(
        &self,
        actor: &Actor,
        team_id: TeamId,
        patch: TeamPatch,
    ) -> CoreResult<Team> {
        let mut uow = self.ctx.store.begin().await?;
        let result = update_in(&mut *uow, actor, team_id, patch).await;
        self.ctx.finish(uow, result).await
    }

    /// Team with roster, matches and statistics
    pub async fn get_team(&self, team_id: TeamId) -> CoreResult<TeamDetail> {
        let mut uow = self.ctx.store.begin().await?;
        let result = detail_in(&mut *uow, team_id).await;
        self.ctx.finish(uow, result).await
    }

    /// Teams passing `filter`, by name
    pub async fn list_teams(&self, filter: &TeamFilter, page: Page) -> CoreResult<Vec<Team>> {
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.list_teams(filter, page).await;
        self.ctx.finish(uow, result).await
    }
}

async fn ensure_name_free<R: Repository + ?Sized>(repo: &mut R, name: &str) -> CoreResult<()> {
    if repo.find_team_by_name(name).await?.is_some() {
        return Err(CoreError::conflict(format!(
            "A team with the name '{name}' already exists"
        )));
    }
    Ok(())
}

async fn create_in<R: Repository + ?Sized>(
    repo: &mut R,
    actor: &Actor,
    new: NewTeam,
) -> CoreResult<Team> {
    let name = new.name.trim().to_string();
    first_failure([director_or_admin(actor), non_empty("Team name", &name)])?;
    ensure_name_free(repo, &name).await?;

    let mut team = Team::new(name);
    team.logo = new.logo;
    repo.insert_team(&team).await?;
    Ok(team)
}

async fn update_in<R: Repository + ?Sized>(
    repo: &mut R,
    actor: &Actor,
    team_id: TeamId,
    patch: TeamPatch,
) -> CoreResult<Team> {
    director_or_admin(actor)?;
    let mut team = require(repo.find_team(team_id).await?, "Team")?;

    if let Some(name) = patch.name {
        let name = name.trim().to_string();
        non_empty("Team name", &name)?;
        if name != team.name {
            ensure_name_free(repo, &name).await?;
            team.name = name;
        }
    }
    if let Some(logo) = patch.logo {
        team.logo = Some(logo);
    }

    repo.update_team(&team).await?;
    Ok(team)
}

async fn detail_in<R: Repository + ?Sized>(repo: &mut R, team_id: TeamId) -> CoreResult<TeamDetail> {
    let team = require(repo.find_team(team_id).await?, "Team")?;
    let players = repo.list_team_players(team.id).await?;
    let matches = repo.list_team_matches(team.id).await?;
    let statistics = team_statistics(repo, team.id, &matches).await?;
    Ok(TeamDetail {
        team,
        players,
        matches,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::db::MemoryStore;
    use crate::notify::LogNotifier;
    use crate::settings::CompetitionSettings;
    use uuid::Uuid;

    fn manager() -> TeamManager {
        let ctx = EngineContext::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            CompetitionSettings::default(),
        );
        TeamManager::new(Arc::new(ctx))
    }

    fn new_team(name: &str) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            logo: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_team() {
        let teams = manager();
        let director = Actor::new(Uuid::new_v4(), Role::Director);

        let team = teams.create_team(&director, new_team("  Falcons ")).await.unwrap();
        assert_eq!(team.name, "Falcons");
        assert!(team.is_free());

        let detail = teams.get_team(team.id).await.unwrap();
        assert!(detail.players.is_empty());
        assert!(detail.matches.is_empty());
        assert_eq!(detail.statistics.match_win_ratio, "0%");
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let teams = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        teams.create_team(&admin, new_team("Falcons")).await.unwrap();
        let other = teams.create_team(&admin, new_team("Owls")).await.unwrap();

        assert!(matches!(
            teams.create_team(&admin, new_team("Falcons")).await,
            Err(CoreError::Conflict(_))
        ));

        let rename = TeamPatch {
            name: Some("Falcons".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            teams.update_team(&admin, other.id, rename).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_plain_user_cannot_manage_teams() {
        let teams = manager();
        let user = Actor::new(Uuid::new_v4(), Role::Player);
        assert!(matches!(
            teams.create_team(&user, new_team("Falcons")).await,
            Err(CoreError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let teams = manager();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let team = teams.create_team(&admin, new_team("Falcons")).await.unwrap();
        teams.create_team(&admin, new_team("Night Owls")).await.unwrap();

        let updated = teams
            .update_team(
                &admin,
                team.id,
                TeamPatch {
                    name: Some("Red Falcons".to_string()),
                    logo: Some("falcon.png".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Red Falcons");
        assert_eq!(updated.logo.as_deref(), Some("falcon.png"));

        let found = teams
            .list_teams(
                &TeamFilter {
                    search: Some("FALCON".to_string()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, team.id);

        assert!(matches!(
            teams.get_team(Uuid::new_v4()).await,
            Err(CoreError::NotFound("Team"))
        ));
    }
}
