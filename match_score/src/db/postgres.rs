//! PostgreSQL store.
//!
//! Every unit of work is a database transaction. Enum columns are stored as
//! their text form and parsed back when rows are read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgRow};
use sqlx::{Postgres, QueryBuilder, Row, Transaction};
use std::str::FromStr;
use std::sync::Arc;

use super::Page;
use super::repository::{Repository, Store, UnitOfWork};
use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_default_timeout, with_timeout};
use crate::auth::{User, UserId};
use crate::error::{CoreError, CoreResult};
use crate::game::{Match, MatchFilter, MatchId};
use crate::requests::{Request, RequestFilter, RequestId, SortOrder};
use crate::team::{Player, PlayerId, Team, TeamFilter, TeamId};
use crate::tournament::{
    Period, PrizeCut, Tournament, TournamentFilter, TournamentId, TournamentStatus,
};

const USER_COLUMNS: &str = "id, email, role, created_at";
const TOURNAMENT_COLUMNS: &str =
    "id, title, format, start_date, end_date, prize_pool, current_stage, director_id";
const TEAM_COLUMNS: &str = "id, name, logo, played_games, won_games, tournament_id";
const PLAYER_COLUMNS: &str = "id, username, first_name, last_name, country, avatar, \
     played_games, won_games, user_id, team_id";
const MATCH_COLUMNS: &str = "id, match_format, start_time, is_finished, stage, team1_id, \
     team2_id, team1_score, team2_score, winner_team_id, tournament_id";
const PRIZE_CUT_COLUMNS: &str = "id, place, amount, tournament_id, team_id";
const REQUEST_COLUMNS: &str =
    "id, request_type, status, user_id, username, admin_id, request_date, response_date";

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    /// Create a new store
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> CoreResult<Box<dyn UnitOfWork>> {
        let tx = with_timeout(DEFAULT_TRANSACTION_TIMEOUT, self.pool.begin()).await?;
        Ok(Box::new(PgUnitOfWork { tx: Some(tx) }))
    }
}

/// Unit of work wrapping one PostgreSQL transaction
///
/// Dropping it without committing rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> CoreResult<&mut PgConnection> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| CoreError::state("Unit of work is already closed"))
    }
}

/// Parse a text column into a domain enum
fn parse_column<T>(row: &PgRow, column: &str) -> CoreResult<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: String| CoreError::Database(sqlx::Error::Decode(e.into())))
}

fn user_from_row(row: &PgRow) -> CoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        role: parse_column(row, "role")?,
        created_at: row.try_get("created_at")?,
    })
}

fn tournament_from_row(row: &PgRow) -> CoreResult<Tournament> {
    Ok(Tournament {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        format: parse_column(row, "format")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        prize_pool: row.try_get("prize_pool")?,
        current_stage: parse_column(row, "current_stage")?,
        director_id: row.try_get("director_id")?,
    })
}

fn team_from_row(row: &PgRow) -> CoreResult<Team> {
    Ok(Team {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        logo: row.try_get("logo")?,
        played_games: row.try_get("played_games")?,
        won_games: row.try_get("won_games")?,
        tournament_id: row.try_get("tournament_id")?,
    })
}

fn player_from_row(row: &PgRow) -> CoreResult<Player> {
    Ok(Player {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        country: row.try_get("country")?,
        avatar: row.try_get("avatar")?,
        played_games: row.try_get("played_games")?,
        won_games: row.try_get("won_games")?,
        user_id: row.try_get("user_id")?,
        team_id: row.try_get("team_id")?,
    })
}

fn match_from_row(row: &PgRow) -> CoreResult<Match> {
    Ok(Match {
        id: row.try_get("id")?,
        match_format: parse_column(row, "match_format")?,
        start_time: row.try_get("start_time")?,
        is_finished: row.try_get("is_finished")?,
        stage: parse_column(row, "stage")?,
        team1_id: row.try_get("team1_id")?,
        team2_id: row.try_get("team2_id")?,
        team1_score: row.try_get("team1_score")?,
        team2_score: row.try_get("team2_score")?,
        winner_team_id: row.try_get("winner_team_id")?,
        tournament_id: row.try_get("tournament_id")?,
    })
}

fn prize_cut_from_row(row: &PgRow) -> CoreResult<PrizeCut> {
    Ok(PrizeCut {
        id: row.try_get("id")?,
        place: row.try_get("place")?,
        amount: row.try_get("amount")?,
        tournament_id: row.try_get("tournament_id")?,
        team_id: row.try_get("team_id")?,
    })
}

fn request_from_row(row: &PgRow) -> CoreResult<Request> {
    Ok(Request {
        id: row.try_get("id")?,
        request_type: parse_column(row, "request_type")?,
        status: parse_column(row, "status")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        admin_id: row.try_get("admin_id")?,
        request_date: row.try_get("request_date")?,
        response_date: row.try_get("response_date")?,
    })
}

fn rows_into<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> CoreResult<T>) -> CoreResult<Vec<T>> {
    rows.iter().map(map).collect()
}

/// Fail with `NotFound` when an UPDATE touched no row
fn expect_one(rows_affected: u64, entity: &'static str) -> CoreResult<()> {
    if rows_affected == 0 {
        Err(CoreError::NotFound(entity))
    } else {
        Ok(())
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" OFFSET ").push_bind(page.offset);
    qb.push(" LIMIT ").push_bind(page.limit);
}

#[async_trait]
impl Repository for PgUnitOfWork {
    async fn insert_user(&mut self, user: &User) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query("INSERT INTO users (id, email, role, created_at) VALUES ($1, $2, $3, $4)")
                .bind(user.id)
                .bind(&user.email)
                .bind(user.role.as_str())
                .bind(user.created_at)
                .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn find_user(&mut self, user_id: UserId) -> CoreResult<Option<User>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(user_id)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&mut self, user: &User) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query("UPDATE users SET email = $2, role = $3 WHERE id = $1")
                .bind(user.id)
                .bind(&user.email)
                .bind(user.role.as_str())
                .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "User")
    }

    async fn insert_tournament(&mut self, tournament: &Tournament) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(&format!(
                "INSERT INTO tournaments ({TOURNAMENT_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            ))
            .bind(tournament.id)
            .bind(&tournament.title)
            .bind(tournament.format.as_str())
            .bind(tournament.start_date)
            .bind(tournament.end_date)
            .bind(tournament.prize_pool)
            .bind(tournament.current_stage.as_str())
            .bind(tournament.director_id)
            .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn find_tournament(&mut self, id: TournamentId) -> CoreResult<Option<Tournament>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn find_tournament_by_title(&mut self, title: &str) -> CoreResult<Option<Tournament>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE title = $1"
            ))
            .bind(title)
            .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE tournaments SET title = $2, format = $3, start_date = $4, end_date = $5, \
                 prize_pool = $6, current_stage = $7, director_id = $8 WHERE id = $1",
            )
            .bind(tournament.id)
            .bind(&tournament.title)
            .bind(tournament.format.as_str())
            .bind(tournament.start_date)
            .bind(tournament.end_date)
            .bind(tournament.prize_pool)
            .bind(tournament.current_stage.as_str())
            .bind(tournament.director_id)
            .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Tournament")
    }

    async fn list_tournaments(
        &mut self,
        filter: &TournamentFilter,
        page: Page,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Tournament>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE TRUE"
        ));

        match filter.period {
            Some(Period::Past) => {
                qb.push(" AND (end_date < ")
                    .push_bind(now)
                    .push(" OR current_stage = 'finished')");
            }
            Some(Period::Present) => {
                qb.push(" AND start_date <= ")
                    .push_bind(now)
                    .push(" AND end_date >= ")
                    .push_bind(now)
                    .push(" AND current_stage <> 'finished'");
            }
            Some(Period::Future) => {
                qb.push(" AND start_date > ")
                    .push_bind(now)
                    .push(" AND current_stage <> 'finished'");
            }
            None => {}
        }

        match filter.status {
            Some(TournamentStatus::Active) => {
                qb.push(" AND current_stage <> 'finished'");
            }
            Some(TournamentStatus::Finished) => {
                qb.push(" AND current_stage = 'finished'");
            }
            None => {}
        }

        if let Some(format) = filter.format {
            qb.push(" AND format = ").push_bind(format.as_str());
        }
        if let Some(search) = &filter.search {
            qb.push(" AND title ILIKE ").push_bind(format!("%{search}%"));
        }
        if let Some(director_id) = filter.director_id {
            qb.push(" AND director_id = ").push_bind(director_id);
        }

        qb.push(" ORDER BY start_date DESC, title ASC");
        push_page(&mut qb, page);

        let conn = self.conn()?;
        let rows = with_default_timeout(qb.build().fetch_all(conn)).await?;
        rows_into(rows, tournament_from_row)
    }

    async fn insert_team(&mut self, team: &Team) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(&format!(
                "INSERT INTO teams ({TEAM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
            ))
            .bind(team.id)
            .bind(&team.name)
            .bind(&team.logo)
            .bind(team.played_games)
            .bind(team.won_games)
            .bind(team.tournament_id)
            .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn find_team(&mut self, id: TeamId) -> CoreResult<Option<Team>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"))
                .bind(id)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(team_from_row).transpose()
    }

    async fn find_team_by_name(&mut self, name: &str) -> CoreResult<Option<Team>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {TEAM_COLUMNS} FROM teams WHERE name = $1"))
                .bind(name)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(team_from_row).transpose()
    }

    async fn update_team(&mut self, team: &Team) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE teams SET name = $2, logo = $3, played_games = $4, won_games = $5, \
                 tournament_id = $6 WHERE id = $1",
            )
            .bind(team.id)
            .bind(&team.name)
            .bind(&team.logo)
            .bind(team.played_games)
            .bind(team.won_games)
            .bind(team.tournament_id)
            .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Team")
    }

    async fn list_tournament_teams(
        &mut self,
        tournament_id: TournamentId,
    ) -> CoreResult<Vec<Team>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {TEAM_COLUMNS} FROM teams WHERE tournament_id = $1 ORDER BY name"
            ))
            .bind(tournament_id)
            .fetch_all(conn),
        )
        .await?;
        rows_into(rows, team_from_row)
    }

    async fn list_teams(&mut self, filter: &TeamFilter, page: Page) -> CoreResult<Vec<Team>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {TEAM_COLUMNS} FROM teams WHERE TRUE"));
        if let Some(search) = &filter.search {
            qb.push(" AND name ILIKE ").push_bind(format!("%{search}%"));
        }
        match filter.is_available {
            Some(true) => {
                qb.push(" AND tournament_id IS NULL");
            }
            Some(false) => {
                qb.push(" AND tournament_id IS NOT NULL");
            }
            None => {}
        }
        qb.push(" ORDER BY name");
        push_page(&mut qb, page);

        let conn = self.conn()?;
        let rows = with_default_timeout(qb.build().fetch_all(conn)).await?;
        rows_into(rows, team_from_row)
    }

    async fn insert_player(&mut self, player: &Player) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(&format!(
                "INSERT INTO players ({PLAYER_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            ))
            .bind(player.id)
            .bind(&player.username)
            .bind(&player.first_name)
            .bind(&player.last_name)
            .bind(&player.country)
            .bind(&player.avatar)
            .bind(player.played_games)
            .bind(player.won_games)
            .bind(player.user_id)
            .bind(player.team_id)
            .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn find_player(&mut self, id: PlayerId) -> CoreResult<Option<Player>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE id = $1"))
                .bind(id)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_player_by_username(&mut self, username: &str) -> CoreResult<Option<Player>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE username = $1"
            ))
            .bind(username)
            .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_player_by_user(&mut self, user_id: UserId) -> CoreResult<Option<Player>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE user_id = $1"
            ))
            .bind(user_id)
            .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(player_from_row).transpose()
    }

    async fn update_player(&mut self, player: &Player) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE players SET username = $2, first_name = $3, last_name = $4, \
                 country = $5, avatar = $6, played_games = $7, won_games = $8, \
                 user_id = $9, team_id = $10 WHERE id = $1",
            )
            .bind(player.id)
            .bind(&player.username)
            .bind(&player.first_name)
            .bind(&player.last_name)
            .bind(&player.country)
            .bind(&player.avatar)
            .bind(player.played_games)
            .bind(player.won_games)
            .bind(player.user_id)
            .bind(player.team_id)
            .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Player")
    }

    async fn list_team_players(&mut self, team_id: TeamId) -> CoreResult<Vec<Player>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {PLAYER_COLUMNS} FROM players WHERE team_id = $1 ORDER BY username"
            ))
            .bind(team_id)
            .fetch_all(conn),
        )
        .await?;
        rows_into(rows, player_from_row)
    }

    async fn insert_matches(&mut self, matches: &[Match]) -> CoreResult<()> {
        if matches.is_empty() {
            return Ok(());
        }

        let mut qb =
            QueryBuilder::<Postgres>::new(format!("INSERT INTO matches ({MATCH_COLUMNS}) "));
        qb.push_values(matches, |mut b, m| {
            b.push_bind(m.id)
                .push_bind(m.match_format.as_str())
                .push_bind(m.start_time)
                .push_bind(m.is_finished)
                .push_bind(m.stage.as_str())
                .push_bind(m.team1_id)
                .push_bind(m.team2_id)
                .push_bind(m.team1_score)
                .push_bind(m.team2_score)
                .push_bind(m.winner_team_id)
                .push_bind(m.tournament_id);
        });

        let conn = self.conn()?;
        with_default_timeout(qb.build().execute(conn)).await?;
        Ok(())
    }

    async fn find_match(&mut self, id: MatchId) -> CoreResult<Option<Match>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
                .bind(id)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(match_from_row).transpose()
    }

    async fn update_match(&mut self, game: &Match) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE matches SET match_format = $2, start_time = $3, is_finished = $4, \
                 stage = $5, team1_id = $6, team2_id = $7, team1_score = $8, team2_score = $9, \
                 winner_team_id = $10 WHERE id = $1",
            )
            .bind(game.id)
            .bind(game.match_format.as_str())
            .bind(game.start_time)
            .bind(game.is_finished)
            .bind(game.stage.as_str())
            .bind(game.team1_id)
            .bind(game.team2_id)
            .bind(game.team1_score)
            .bind(game.team2_score)
            .bind(game.winner_team_id)
            .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Match")
    }

    async fn list_tournament_matches(
        &mut self,
        tournament_id: TournamentId,
    ) -> CoreResult<Vec<Match>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS} FROM matches WHERE tournament_id = $1 \
                 ORDER BY start_time, id"
            ))
            .bind(tournament_id)
            .fetch_all(conn),
        )
        .await?;
        rows_into(rows, match_from_row)
    }

    async fn list_team_matches(&mut self, team_id: TeamId) -> CoreResult<Vec<Match>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {MATCH_COLUMNS} FROM matches WHERE team1_id = $1 OR team2_id = $1 \
                 ORDER BY start_time, id"
            ))
            .bind(team_id)
            .fetch_all(conn),
        )
        .await?;
        rows_into(rows, match_from_row)
    }

    async fn list_matches(&mut self, filter: &MatchFilter, page: Page) -> CoreResult<Vec<Match>> {
        let columns = MATCH_COLUMNS
            .split(", ")
            .map(|c| format!("m.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {columns} FROM matches m JOIN tournaments t ON t.id = m.tournament_id \
             WHERE TRUE"
        ));

        if let Some(title) = &filter.tournament_title {
            qb.push(" AND t.title ILIKE ").push_bind(format!("%{title}%"));
        }
        if let Some(stage) = filter.stage {
            qb.push(" AND m.stage = ").push_bind(stage.as_str());
        }
        if let Some(is_finished) = filter.is_finished {
            qb.push(" AND m.is_finished = ").push_bind(is_finished);
        }
        if let Some(team_name) = &filter.team_name {
            qb.push(
                " AND EXISTS (SELECT 1 FROM teams tm \
                 WHERE (tm.id = m.team1_id OR tm.id = m.team2_id) AND tm.name = ",
            )
            .push_bind(team_name.clone())
            .push(")");
        }
        qb.push(" ORDER BY m.start_time DESC, m.id");
        push_page(&mut qb, page);

        let conn = self.conn()?;
        let rows = with_default_timeout(qb.build().fetch_all(conn)).await?;
        rows_into(rows, match_from_row)
    }

    async fn insert_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(&format!(
                "INSERT INTO prize_cuts ({PRIZE_CUT_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
            ))
            .bind(cut.id)
            .bind(cut.place)
            .bind(cut.amount)
            .bind(cut.tournament_id)
            .bind(cut.team_id)
            .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn list_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<Vec<PrizeCut>> {
        let conn = self.conn()?;
        let rows = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {PRIZE_CUT_COLUMNS} FROM prize_cuts WHERE tournament_id = $1 ORDER BY place"
            ))
            .bind(tournament_id)
            .fetch_all(conn),
        )
        .await?;
        rows_into(rows, prize_cut_from_row)
    }

    async fn update_prize_cut(&mut self, cut: &PrizeCut) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query("UPDATE prize_cuts SET place = $2, amount = $3, team_id = $4 WHERE id = $1")
                .bind(cut.id)
                .bind(cut.place)
                .bind(cut.amount)
                .bind(cut.team_id)
                .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Prize cut")
    }

    async fn delete_prize_cuts(&mut self, tournament_id: TournamentId) -> CoreResult<u64> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query("DELETE FROM prize_cuts WHERE tournament_id = $1")
                .bind(tournament_id)
                .execute(conn),
        )
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_request(&mut self, request: &Request) -> CoreResult<()> {
        let conn = self.conn()?;
        with_default_timeout(
            sqlx::query(&format!(
                "INSERT INTO requests ({REQUEST_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
            ))
            .bind(request.id)
            .bind(request.request_type.as_str())
            .bind(request.status.as_str())
            .bind(request.user_id)
            .bind(&request.username)
            .bind(request.admin_id)
            .bind(request.request_date)
            .bind(request.response_date)
            .execute(conn),
        )
        .await?;
        Ok(())
    }

    async fn find_request(&mut self, id: RequestId) -> CoreResult<Option<Request>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1"))
                .bind(id)
                .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn find_pending_request(&mut self, user_id: UserId) -> CoreResult<Option<Request>> {
        let conn = self.conn()?;
        let row = with_default_timeout(
            sqlx::query(&format!(
                "SELECT {REQUEST_COLUMNS} FROM requests WHERE user_id = $1 AND status = 'pending'"
            ))
            .bind(user_id)
            .fetch_optional(conn),
        )
        .await?;
        row.as_ref().map(request_from_row).transpose()
    }

    async fn update_request(&mut self, request: &Request) -> CoreResult<()> {
        let conn = self.conn()?;
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE requests SET status = $2, admin_id = $3, response_date = $4 WHERE id = $1",
            )
            .bind(request.id)
            .bind(request.status.as_str())
            .bind(request.admin_id)
            .bind(request.response_date)
            .execute(conn),
        )
        .await?;
        expect_one(result.rows_affected(), "Request")
    }

    async fn list_requests(
        &mut self,
        filter: &RequestFilter,
        page: Page,
    ) -> CoreResult<Vec<Request>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {REQUEST_COLUMNS} FROM requests WHERE TRUE"
        ));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(request_type) = filter.request_type {
            qb.push(" AND request_type = ").push_bind(request_type.as_str());
        }
        if let Some(admin_id) = filter.admin_id {
            qb.push(" AND admin_id = ").push_bind(admin_id);
        }
        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        qb.push(match filter.order {
            SortOrder::Asc => " ORDER BY request_date ASC, id",
            SortOrder::Desc => " ORDER BY request_date DESC, id DESC",
        });
        push_page(&mut qb, page);

        let conn = self.conn()?;
        let rows = with_default_timeout(qb.build().fetch_all(conn)).await?;
        rows_into(rows, request_from_row)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(&mut self) -> CoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| CoreError::state("Unit of work is already closed"))?;
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, tx.commit()).await?;
        Ok(())
    }

    async fn rollback(&mut self) -> CoreResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| CoreError::state("Unit of work is already closed"))?;
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, tx.rollback()).await?;
        Ok(())
    }
}
