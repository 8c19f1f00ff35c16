//! Admin commands and their execution against the engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Error, anyhow, bail};
use log::{error, info};
use match_score::{
    Actor, CoreError, EngineContext, MatchManager, RequestManager, TournamentManager, UserManager,
    auth::{Role, UserId},
    db::{Database, Page},
    game::{MatchId, Side},
    requests::{Decision, RequestFilter, RequestId, RequestStatus},
    tournament::{NewTournament, TournamentId},
};
use pico_args::Arguments;
use serde::Serialize;

/// One invocation of the runner
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Migrate,
    Health,
    CreateUser {
        email: String,
        role: Role,
    },
    CreateTournament {
        file: PathBuf,
        actor: UserId,
    },
    ShowTournament {
        id: TournamentId,
    },
    Score {
        match_id: MatchId,
        side: Side,
        actor: UserId,
    },
    PendingRequests {
        actor: UserId,
    },
    Respond {
        request_id: RequestId,
        decision: Decision,
        actor: UserId,
    },
}

impl Command {
    /// Parse the subcommand and its options from `pargs`
    pub fn parse(pargs: &mut Arguments) -> Result<Self, Error> {
        let Some(name) = pargs.subcommand()? else {
            bail!("missing command, see --help");
        };

        let command = match name.as_str() {
            "migrate" => Command::Migrate,
            "health" => Command::Health,
            "create-user" => Command::CreateUser {
                email: pargs.value_from_str("--email")?,
                role: pargs.value_from_str("--role")?,
            },
            "create-tournament" => Command::CreateTournament {
                file: pargs.value_from_str("--file")?,
                actor: pargs.value_from_str("--as")?,
            },
            "show-tournament" => Command::ShowTournament {
                id: pargs.value_from_str("--id")?,
            },
            "score" => Command::Score {
                match_id: pargs.value_from_str("--match")?,
                side: pargs.value_from_str("--side")?,
                actor: pargs.value_from_str("--as")?,
            },
            "pending-requests" => Command::PendingRequests {
                actor: pargs.value_from_str("--as")?,
            },
            "respond" => Command::Respond {
                request_id: pargs.value_from_str("--request")?,
                decision: pargs.value_from_str("--decision")?,
                actor: pargs.value_from_str("--as")?,
            },
            other => bail!("unknown command '{other}', see --help"),
        };
        Ok(command)
    }

    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Migrate => "migrate",
            Command::Health => "health",
            Command::CreateUser { .. } => "create-user",
            Command::CreateTournament { .. } => "create-tournament",
            Command::ShowTournament { .. } => "show-tournament",
            Command::Score { .. } => "score",
            Command::PendingRequests { .. } => "pending-requests",
            Command::Respond { .. } => "respond",
        }
    }
}

/// Engine managers sharing one context
pub struct Runner {
    db: Database,
    users: UserManager,
    tournaments: TournamentManager,
    matches: MatchManager,
    requests: RequestManager,
}

impl Runner {
    pub fn new(db: Database, ctx: Arc<EngineContext>) -> Self {
        Self {
            db,
            users: UserManager::new(ctx.clone()),
            tournaments: TournamentManager::new(ctx.clone()),
            matches: MatchManager::new(ctx.clone()),
            requests: RequestManager::new(ctx),
        }
    }

    /// Execute `command` and print its result as JSON on stdout
    pub async fn run(&self, command: Command) -> Result<(), Error> {
        match command {
            Command::Migrate => {
                self.db.migrate().await.context("Migration failed")?;
                info!("Migrations applied");
            }
            Command::Health => {
                self.db.health_check().await.context("Database is unhealthy")?;
                info!("Database is healthy");
            }
            Command::CreateUser { email, role } => {
                let user = self.users.create_user(&email, role).await.map_err(reported)?;
                print_json(&user)?;
            }
            Command::CreateTournament { file, actor } => {
                let actor = self.actor(actor).await?;
                let raw = std::fs::read_to_string(&file)
                    .with_context(|| format!("Cannot read {}", file.display()))?;
                let new: NewTournament = serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid tournament definition in {}", file.display()))?;
                let tournament = self
                    .tournaments
                    .create_tournament(&actor, new)
                    .await
                    .map_err(reported)?;
                print_json(&tournament)?;
            }
            Command::ShowTournament { id } => {
                let detail = self.tournaments.get_tournament(id).await.map_err(reported)?;
                print_json(&detail)?;
            }
            Command::Score {
                match_id,
                side,
                actor,
            } => {
                let actor = self.actor(actor).await?;
                let game = self
                    .matches
                    .update_match_score(&actor, match_id, side)
                    .await
                    .map_err(reported)?;
                print_json(&game)?;
            }
            Command::PendingRequests { actor } => {
                let actor = self.actor(actor).await?;
                let filter = RequestFilter {
                    status: Some(RequestStatus::Pending),
                    ..Default::default()
                };
                let pending = self
                    .requests
                    .list_requests(&actor, &filter, Page::default())
                    .await
                    .map_err(reported)?;
                print_json(&pending)?;
            }
            Command::Respond {
                request_id,
                decision,
                actor,
            } => {
                let actor = self.actor(actor).await?;
                let request = self
                    .requests
                    .respond(&actor, request_id, decision)
                    .await
                    .map_err(reported)?;
                print_json(&request)?;
            }
        }
        Ok(())
    }

    async fn actor(&self, user_id: UserId) -> Result<Actor, Error> {
        let user = self
            .users
            .get_user(user_id)
            .await
            .map_err(reported)
            .with_context(|| format!("Unknown acting user {user_id}"))?;
        Ok(Actor::from(&user))
    }
}

/// Log the full engine error and keep only its client-safe message
fn reported(err: CoreError) -> Error {
    error!("{err}");
    anyhow!(err.client_message())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(raw: &[&str]) -> Arguments {
        Arguments::from_vec(raw.iter().map(OsString::from).collect())
    }

    #[test]
    fn test_parse_score() {
        let id = uuid::Uuid::new_v4();
        let actor = uuid::Uuid::new_v4();
        let mut pargs = args(&[
            "score",
            "--match",
            &id.to_string(),
            "--side",
            "team2",
            "--as",
            &actor.to_string(),
        ]);
        let command = Command::parse(&mut pargs).unwrap();
        assert_eq!(
            command,
            Command::Score {
                match_id: id,
                side: Side::Team2,
                actor,
            }
        );
        assert_eq!(command.name(), "score");
    }

    #[test]
    fn test_parse_create_user() {
        let mut pargs = args(&["create-user", "--email", "a@b.io", "--role", "director"]);
        assert_eq!(
            Command::parse(&mut pargs).unwrap(),
            Command::CreateUser {
                email: "a@b.io".to_string(),
                role: Role::Director,
            }
        );
    }

    #[test]
    fn test_reported_errors_hide_storage_details() {
        let err = reported(CoreError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(err.to_string(), "Internal server error");

        let err = reported(CoreError::NotFound("Match"));
        assert_eq!(err.to_string(), "Match not found");
    }

    #[test]
    fn test_parse_rejects_unknown_and_bad_values() {
        assert!(Command::parse(&mut args(&["dance"])).is_err());
        assert!(Command::parse(&mut args(&[])).is_err());
        assert!(
            Command::parse(&mut args(&["create-user", "--email", "a@b.io", "--role", "king"]))
                .is_err()
        );
    }
}
