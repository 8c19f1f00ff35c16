//! Player manager.

use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::models::{NewPlayer, Player, PlayerDetail, PlayerId, PlayerPatch, TeamId};
use crate::auth::Actor;
use crate::context::EngineContext;
use crate::db::Repository;
use crate::error::{CoreError, CoreResult, require};
use crate::validation::{director_or_admin, first_failure, non_empty, roster_has_space};

/// Player manager
#[derive(Clone)]
pub struct PlayerManager {
    ctx: Arc<EngineContext>,
}

impl PlayerManager {
    /// Create a new player manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Register a player, optionally straight onto a team's roster
    ///
    /// # Arguments
    ///
    /// * `actor` - Director or admin
    /// * `new` - Player profile; `team_name` must name an existing team with
    ///   a free roster slot
    ///
    /// # Returns
    ///
    /// * `CoreResult<Player>` - The stored player
    pub async fn create_player(&self, actor: &Actor, new: NewPlayer) -> CoreResult<Player> {
        let mut uow = self.ctx.store.begin().await?;
        let result = self.create_in(&mut *uow, actor, new).await;
        let player = self.ctx.finish(uow, result).await?;
        info!("Player '{}' created by {}", player.username, actor.id);
        Ok(player)
    }

    async fn create_in<R: Repository + ?Sized>(
        &self,
        repo: &mut R,
        actor: &Actor,
        new: NewPlayer,
    ) -> CoreResult<Player> {
        let username = new.username.trim().to_string();
        first_failure([
            director_or_admin(actor),
            non_empty("Username", &username),
            non_empty("First name", &new.first_name),
            non_empty("Last name", &new.last_name),
            non_empty("Country", &new.country),
        ])?;
        ensure_username_free(repo, &username).await?;

        let team_id = match new.team_name.as_deref() {
            Some(name) => Some(self.team_with_space(repo, name).await?),
            None => None,
        };

        let player = Player {
            id: Uuid::new_v4(),
            username,
            first_name: new.first_name,
            last_name: new.last_name,
            country: new.country,
            avatar: new.avatar,
            played_games: 0,
            won_games: 0,
            user_id: None,
            team_id,
        };
        repo.insert_player(&player).await?;
        Ok(player)
    }

    /// Edit a player's profile or move them to another team
    ///
    /// A player linked to a user may be edited only by that user or an
    /// admin. Unlinked players are managed by directors and admins.
    pub async fn update_player(
        &self,
        actor: &Actor,
        player_id: PlayerId,
        patch: PlayerPatch,
    ) -> CoreResult<Player> {
        let mut uow = self.ctx.store.begin().await?;
        let result = self.update_in(&mut *uow, actor, player_id, patch).await;
        self.ctx.finish(uow, result).await
    }

    async fn update_in<R: Repository + ?Sized>(
        &self,
        repo: &mut R,
        actor: &Actor,
        player_id: PlayerId,
        patch: PlayerPatch,
    ) -> CoreResult<Player> {
        let mut player = require(repo.find_player(player_id).await?, "Player")?;
        may_edit(actor, &player)?;

        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            non_empty("Username", &username)?;
            if username != player.username {
                ensure_username_free(repo, &username).await?;
                player.username = username;
            }
        }
        if let Some(first_name) = patch.first_name {
            non_empty("First name", &first_name)?;
            player.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            non_empty("Last name", &last_name)?;
            player.last_name = last_name;
        }
        if let Some(country) = patch.country {
            non_empty("Country", &country)?;
            player.country = country;
        }
        if let Some(avatar) = patch.avatar {
            player.avatar = Some(avatar);
        }
        if let Some(name) = patch.team_name {
            let current = match player.team_id {
                Some(team_id) => repo.find_team(team_id).await?,
                None => None,
            };
            if current.is_none_or(|team| team.name != name) {
                player.team_id = Some(self.team_with_space(repo, &name).await?);
            }
        }

        repo.update_player(&player).await?;
        Ok(player)
    }

    /// Player with team name and the title of the team's tournament
    pub async fn get_player(&self, player_id: PlayerId) -> CoreResult<PlayerDetail> {
        let mut uow = self.ctx.store.begin().await?;
        let result = match uow.find_player(player_id).await {
            Ok(found) => detail_of(&mut *uow, found).await,
            Err(e) => Err(e),
        };
        self.ctx.finish(uow, result).await
    }

    /// The player linked to the calling user
    pub async fn get_player_for_user(&self, actor: &Actor) -> CoreResult<PlayerDetail> {
        let mut uow = self.ctx.store.begin().await?;
        let result = match uow.find_player_by_user(actor.id).await {
            Ok(found) => detail_of(&mut *uow, found).await,
            Err(e) => Err(e),
        };
        self.ctx.finish(uow, result).await
    }

    async fn team_with_space<R: Repository + ?Sized>(
        &self,
        repo: &mut R,
        name: &str,
    ) -> CoreResult<TeamId> {
        let team = require(repo.find_team_by_name(name).await?, "Team")?;
        let roster = repo.list_team_players(team.id).await?.len();
        roster_has_space(&team.name, roster, self.ctx.settings.max_roster_size)?;
        Ok(team.id)
    }
}

fn may_edit(actor: &Actor, player: &Player) -> CoreResult<()> {
    match player.user_id {
        Some(user_id) if user_id == actor.id || actor.is_admin() => Ok(()),
        Some(_) => Err(CoreError::Authorization(
            "Only the linked user or an admin can edit this player".to_string(),
        )),
        None => director_or_admin(actor),
    }
}

async fn ensure_username_free<R: Repository + ?Sized>(
    repo: &mut R,
    username: &str,
) -> CoreResult<()> {
    if repo.find_player_by_username(username).await?.is_some() {
        return Err(CoreError::conflict(format!(
            "A player with the username '{username}' already exists"
        )));
    }
    Ok(())
}

async fn detail_of<R: Repository + ?Sized>(
    repo: &mut R,
    found: Option<Player>,
) -> CoreResult<PlayerDetail> {
    let player = require(found, "Player")?;
    let team = match player.team_id {
        Some(team_id) => repo.find_team(team_id).await?,
        None => None,
    };
    let tournament_title = match team.as_ref().and_then(|t| t.tournament_id) {
        Some(tournament_id) => repo
            .find_tournament(tournament_id)
            .await?
            .map(|t| t.title),
        None => None,
    };
    Ok(PlayerDetail {
        team_name: team.map(|t| t.name),
        tournament_title,
        player,
    })
}
