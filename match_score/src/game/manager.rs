//! Match manager: scoring, rescheduling and browsing matches.

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;

use super::finalizer::{handle_finished, mark_finished};
use super::models::{Match, MatchFilter, MatchId, MatchPatch, Side};
use super::scoring::{credit_point, evaluate};
use crate::auth::Actor;
use crate::constants::NOTIFICATION_TIME_FORMAT;
use crate::context::EngineContext;
use crate::db::{Page, Repository};
use crate::error::{CoreError, CoreResult, require};
use crate::notify::Outbox;
use crate::team::linked_emails;
use crate::tournament::Tournament;
use crate::tournament::progression::advance_if_stage_complete;
use crate::validation::{
    author_of_tournament, director_or_admin, first_failure, match_not_finished, match_not_started,
    roster_complete,
};

/// Match manager
#[derive(Clone)]
pub struct MatchManager {
    ctx: Arc<EngineContext>,
}

impl MatchManager {
    /// Create a new match manager
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Award one round to `side`
    ///
    /// When the round decides the match, the match is closed, counters are
    /// updated, the loser is eliminated or the prizes paid, and the
    /// tournament advances if this was the last open match of its stage.
    ///
    /// # Arguments
    ///
    /// * `actor` - Director of the tournament or an admin
    /// * `match_id` - Match being scored
    /// * `side` - Team that won the round
    ///
    /// # Returns
    ///
    /// * `CoreResult<Match>` - The match after the update
    pub async fn update_match_score(
        &self,
        actor: &Actor,
        match_id: MatchId,
        side: Side,
    ) -> CoreResult<Match> {
        let mut uow = self.ctx.store.begin().await?;
        let mut outbox = Outbox::new();
        let result = self
            .score_in(&mut *uow, &mut outbox, actor, match_id, side)
            .await;
        let game = self.ctx.finish(uow, result).await?;
        self.ctx.deliver(outbox).await;
        Ok(game)
    }

    async fn score_in<R: Repository + ?Sized>(
        &self,
        repo: &mut R,
        outbox: &mut Outbox,
        actor: &Actor,
        match_id: MatchId,
        side: Side,
    ) -> CoreResult<Match> {
        director_or_admin(actor)?;
        let mut game = require(repo.find_match(match_id).await?, "Match")?;
        let mut tournament = require(repo.find_tournament(game.tournament_id).await?, "Tournament")?;
        first_failure([
            author_of_tournament(actor, &tournament),
            match_not_finished(&game),
        ])?;

        let min_roster = self.ctx.settings.min_roster_size;
        for team_id in [game.team1_id, game.team2_id] {
            let team = require(repo.find_team(team_id).await?, "Team")?;
            let roster = repo.list_team_players(team_id).await?.len();
            roster_complete(&team.name, roster, min_roster)?;
        }

        credit_point(&mut game, side);

        match evaluate(&game) {
            Some(outcome) => {
                mark_finished(repo, &mut game, &outcome).await?;
                handle_finished(repo, &tournament, &game, &outcome).await?;
                info!(
                    "Match {} finished {}:{} in '{}'",
                    game.id, game.team1_score, game.team2_score, tournament.title
                );
                advance_if_stage_complete(repo, &self.ctx, &mut tournament, outbox).await?;
            }
            None => repo.update_match(&game).await?,
        }

        Ok(game)
    }

    /// Reschedule a match, override its stage or swap a team
    ///
    /// Only matches that have neither started nor been scored may change.
    /// Replacing a team releases the old one from the tournament and enrolls
    /// the new one. Nothing is stored if any part of the patch fails.
    pub async fn update_match(
        &self,
        actor: &Actor,
        match_id: MatchId,
        patch: MatchPatch,
    ) -> CoreResult<Match> {
        let mut uow = self.ctx.store.begin().await?;
        let mut outbox = Outbox::new();
        let result = update_in(&mut *uow, &mut outbox, actor, match_id, patch).await;
        let game = self.ctx.finish(uow, result).await?;
        self.ctx.deliver(outbox).await;
        Ok(game)
    }

    /// Get a match by ID
    pub async fn get_match(&self, match_id: MatchId) -> CoreResult<Match> {
        let mut uow = self.ctx.store.begin().await?;
        let result = uow.find_match(match_id).await;
        let found = self.ctx.finish(uow, result).await?;
        require(found, "Match")
    }

    /// Matches passing `filter`, latest start first
    ///
    /// Filtering by a team name that does not exist is a `NotFound` error.
    pub async fn list_matches(&self, filter: &MatchFilter, page: Page) -> CoreResult<Vec<Match>> {
        let mut uow = self.ctx.store.begin().await?;
        let result = list_in(&mut *uow, filter, page).await;
        self.ctx.finish(uow, result).await
    }
}

async fn update_in<R: Repository + ?Sized>(
    repo: &mut R,
    outbox: &mut Outbox,
    actor: &Actor,
    match_id: MatchId,
    patch: MatchPatch,
) -> CoreResult<Match> {
    let now = Utc::now();
    director_or_admin(actor)?;
    let mut game = require(repo.find_match(match_id).await?, "Match")?;
    let tournament = require(repo.find_tournament(game.tournament_id).await?, "Tournament")?;
    first_failure([
        author_of_tournament(actor, &tournament),
        match_not_finished(&game),
        match_not_started(&game, now),
    ])?;

    if let Some(start_time) = patch.start_time {
        if start_time != game.start_time {
            reschedule(repo, outbox, &tournament, &mut game, start_time, now).await?;
        }
    }

    if let Some(stage) = patch.stage {
        game.stage = stage;
    }

    for (side, name) in [(Side::Team1, patch.team1_name), (Side::Team2, patch.team2_name)] {
        if let Some(name) = name {
            replace_team(repo, outbox, &tournament, &mut game, side, &name).await?;
        }
    }

    repo.update_match(&game).await?;
    Ok(game)
}

async fn reschedule<R: Repository + ?Sized>(
    repo: &mut R,
    outbox: &mut Outbox,
    tournament: &Tournament,
    game: &mut Match,
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if start_time < tournament.start_date || start_time > tournament.end_date {
        return Err(CoreError::validation(
            "Start time must fall between the tournament's start and end dates",
        ));
    }
    if start_time < now {
        return Err(CoreError::validation("Start time cannot be in the past"));
    }

    let previous = std::mem::replace(&mut game.start_time, start_time);

    if let Some(director) = repo.find_user(tournament.director_id).await? {
        outbox.push(
            director.email,
            "Match Updated",
            format!(
                "Match's date has been updated from {} to {}",
                previous.format(NOTIFICATION_TIME_FORMAT),
                start_time.format(NOTIFICATION_TIME_FORMAT)
            ),
        );
    }
    Ok(())
}

async fn replace_team<R: Repository + ?Sized>(
    repo: &mut R,
    outbox: &mut Outbox,
    tournament: &Tournament,
    game: &mut Match,
    side: Side,
    name: &str,
) -> CoreResult<()> {
    let mut incoming = require(repo.find_team_by_name(name).await?, "Team")?;
    let current_id = game.team_id(side);
    if incoming.id == current_id {
        return Ok(());
    }
    if incoming.id == game.team_id(side.opponent()) {
        return Err(CoreError::validation("A team cannot play against itself"));
    }
    if incoming
        .tournament_id
        .is_some_and(|id| id != game.tournament_id)
    {
        return Err(CoreError::state(format!(
            "Team '{name}' is already participating in another tournament"
        )));
    }

    let mut outgoing = require(repo.find_team(current_id).await?, "Team")?;
    outgoing.tournament_id = None;
    repo.update_team(&outgoing).await?;

    incoming.tournament_id = Some(game.tournament_id);
    repo.update_team(&incoming).await?;

    match side {
        Side::Team1 => game.team1_id = incoming.id,
        Side::Team2 => game.team2_id = incoming.id,
    }
    debug!(
        "Team '{}' replaced '{}' in match {}",
        incoming.name, outgoing.name, game.id
    );

    let opponent = require(repo.find_team(game.team_id(side.opponent())).await?, "Team")?;
    let message = format!(
        "Your match for the '{}' tournament has been scheduled. You will be playing against {} on {}.",
        tournament.title,
        opponent.name,
        game.start_time.format(NOTIFICATION_TIME_FORMAT)
    );
    for email in linked_emails(repo, incoming.id).await? {
        outbox.push(email, "Match Updated", message.clone());
    }
    Ok(())
}

async fn list_in<R: Repository + ?Sized>(
    repo: &mut R,
    filter: &MatchFilter,
    page: Page,
) -> CoreResult<Vec<Match>> {
    if let Some(name) = &filter.team_name {
        require(repo.find_team_by_name(name).await?, "Team")?;
    }
    repo.list_matches(filter, page).await
}
