//! Request manager: filing and answering promotion and link requests.

use chrono::Utc;
use log::info;
use std::sync::Arc;

use super::models::{Decision, Request, RequestFilter, RequestId, RequestType, SortOrder};
use crate::auth::{Actor, Role};
use crate::context::EngineContext;
use crate::db::{Page, Repository};
use crate::error::{CoreError, CoreResult, require};
use crate::notify::Outbox;
use crate::validation::{admin_only, player_not_linked, plain_user_only, request_not_answered};

/// Request manager
#[derive(Clone)]
pub struct RequestManager {
    ctx: Arc<EngineContext>,
}

impl RequestManager {
    /// Create a new request manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Ask to be promoted to director
    pub async fn send_director_request(&self, actor: &Actor) -> CoreResult<Request> {
        let mut uow = self.ctx.store.begin().await?;
        let result = file_in(&mut *uow, actor, RequestType::PromoteUserToDirector, None).await;
        let request = self.ctx.finish(uow, result).await?;
        info!("User {} asked to become a director", actor.id);
        Ok(request)
    }

    /// Ask to be linked to the player `username`
    ///
    /// # Arguments
    ///
    /// * `actor` - A plain user without another pending request
    /// * `username` - Player that must exist and not be linked yet
    pub async fn send_link_request(&self, actor: &Actor, username: &str) -> CoreResult<Request> {
        let mut uow = self.ctx.store.begin().await?;
        let result = file_in(
            &mut *uow,
            actor,
            RequestType::LinkUserToPlayer,
            Some(username.trim().to_string()),
        )
        .await;
        let request = self.ctx.finish(uow, result).await?;
        info!("User {} asked to be linked to '{}'", actor.id, username);
        Ok(request)
    }

    /// Accept or reject a pending request
    ///
    /// Accepting a link request links the player to the user and makes the
    /// user a player. Accepting a promotion makes the user a director. The
    /// requester is told the outcome by email once the answer is stored.
    ///
    /// # Returns
    ///
    /// * `CoreResult<Request>` - The answered request
    pub async fn respond(
        &self,
        actor: &Actor,
        request_id: RequestId,
        decision: Decision,
    ) -> CoreResult<Request> {
        let mut uow = self.ctx.store.begin().await?;
        let mut outbox = Outbox::new();
        let result = respond_in(&mut *uow, &mut outbox, actor, request_id, decision).await;
        let request = self.ctx.finish(uow, result).await?;
        self.ctx.deliver(outbox).await;

        info!(
            "Request {} ({}) {} by {}",
            request.id, request.request_type, request.status, actor.id
        );
        Ok(request)
    }

    /// All requests passing `filter` (admins only)
    pub async fn list_requests(
        &self,
        actor: &Actor,
        filter: &RequestFilter,
        page: Page,
    ) -> CoreResult<Vec<Request>> {
        admin_only(actor)?;
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.list_requests(filter, page).await;
        self.ctx.finish(uow, result).await
    }

    /// The caller's own requests, newest first
    pub async fn list_own_requests(&self, actor: &Actor, page: Page) -> CoreResult<Vec<Request>> {
        let filter = RequestFilter {
            user_id: Some(actor.id),
            order: SortOrder::Desc,
            ..Default::default()
        };
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.list_requests(&filter, page).await;
        self.ctx.finish(uow, result).await
    }
}

async fn file_in<R: Repository + ?Sized>(
    repo: &mut R,
    actor: &Actor,
    request_type: RequestType,
    username: Option<String>,
) -> CoreResult<Request> {
    plain_user_only(actor)?;
    require(repo.find_user(actor.id).await?, "User")?;

    if repo.find_pending_request(actor.id).await?.is_some() {
        return Err(CoreError::conflict("You already have a pending request"));
    }

    if let Some(username) = &username {
        let player = require(repo.find_player_by_username(username).await?, "Player")?;
        player_not_linked(&player)?;
    }

    let request = Request::pending(actor.id, request_type, username);
    repo.insert_request(&request).await?;
    Ok(request)
}

async fn respond_in<R: Repository + ?Sized>(
    repo: &mut R,
    outbox: &mut Outbox,
    actor: &Actor,
    request_id: RequestId,
    decision: Decision,
) -> CoreResult<Request> {
    admin_only(actor)?;
    let mut request = require(repo.find_request(request_id).await?, "Request")?;
    request_not_answered(&request)?;
    let mut user = require(repo.find_user(request.user_id).await?, "User")?;

    let subject = match decision {
        Decision::Accept => "Request Accepted",
        Decision::Reject => "Request Rejected",
    };
    let verb = match decision {
        Decision::Accept => "accepted",
        Decision::Reject => "rejected",
    };

    let message = match request.request_type {
        RequestType::PromoteUserToDirector => {
            if decision == Decision::Accept {
                user.role = Role::Director;
                repo.update_user(&user).await?;
            }
            format!("Your request to be promoted to director has been {verb}.")
        }
        RequestType::LinkUserToPlayer => {
            let username = request
                .username
                .clone()
                .ok_or_else(|| CoreError::state("Link request carries no player username"))?;
            let mut player = require(repo.find_player_by_username(&username).await?, "Player")?;
            if decision == Decision::Accept {
                player_not_linked(&player)?;
                player.user_id = Some(user.id);
                repo.update_player(&player).await?;
                user.role = Role::Player;
                repo.update_user(&user).await?;
            }
            format!("Your request to be linked to the player '{username}' has been {verb}.")
        }
    };

    request.answer(actor.id, decision, Utc::now());
    repo.update_request(&request).await?;
    outbox.push(user.email, subject, message);
    Ok(request)
}
