//! Admin runner for the tournament engine.
//!
//! Connects to PostgreSQL, builds the engine context and executes one
//! command per invocation, printing results as JSON.

mod commands;
mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use match_score::{
    EngineContext, LogNotifier,
    db::{Database, PgStore},
};
use pico_args::Arguments;

use commands::{Command, Runner};
use config::ServerConfig;

const HELP: &str = "\
Run administrative commands against the match score database

USAGE:
  ms_server [OPTIONS] <COMMAND> [COMMAND OPTIONS]

COMMANDS:
  migrate                                         Apply pending schema migrations
  health                                          Check database connectivity
  create-user --email EMAIL --role ROLE           Create a user (admin, director, player, user)
  create-tournament --file PATH --as USER_ID      Create a tournament from a JSON definition
  show-tournament --id TOURNAMENT_ID              Print a tournament with teams, matches and prizes
  score --match MATCH_ID --side team1|team2 --as USER_ID
                                                  Award one round to a side
  pending-requests --as USER_ID                   List pending requests (admins)
  respond --request REQUEST_ID --decision accept|reject --as USER_ID
                                                  Answer a request (admins)

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  AUTO_MIGRATE             Apply migrations before every command [default: false]
  RUST_LOG                 Log filter [default: info,sqlx=warn]
  (See DatabaseConfig and CompetitionSettings for pool and scheduling variables)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let command = Command::parse(&mut pargs)?;

    let leftover = pargs.finish();
    if !leftover.is_empty() {
        anyhow::bail!("unexpected arguments: {leftover:?}");
    }

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(database_url)?;
    config.validate()?;

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected");

    if config.auto_migrate && command != Command::Migrate {
        db.migrate().await?;
        info!("Migrations applied");
    }

    let store = PgStore::new(Arc::new(db.pool().clone()));
    let ctx = Arc::new(EngineContext::new(
        Arc::new(store),
        Arc::new(LogNotifier),
        config.competition.clone(),
    ));
    let runner = Runner::new(db.clone(), ctx);

    let name = command.name();
    let started = Instant::now();
    let outcome = runner.run(command).await;
    logging::log_performance(name, started.elapsed().as_millis() as u64, None);

    db.close().await;
    outcome
}
