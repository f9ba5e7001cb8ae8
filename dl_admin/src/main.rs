//! Operator command line for draft league tournament files.
//!
//! Each invocation opens the snapshot document, applies one command through
//! the tournament store and prints the result as JSON.

mod commands;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Error};
use commands::{Command, parse_command};
use draft_league::{
    TournamentError, TournamentStore,
    store::{JsonFileRepository, StoreConfig, StoreOptions},
    usage::UsageDirectory,
};
use log::{info, warn};
use pico_args::Arguments;
use serde::Serialize;

const HELP: &str = "\
Manage draft league tournaments stored in a JSON snapshot file

USAGE:
  dl_admin [OPTIONS] COMMAND [ARGS...]

COMMANDS:
  list                                   List tournament names
  create NAME [team=N] [draw=N] [steal=N] [TIER=SCALE ...]
                                         Create a tournament
  show NAME                              Print a tournament snapshot
  clear                                  Remove every tournament
  register NAME PLAYER                   Register a player
  player NAME PLAYER                     Print a player snapshot
  start NAME                             Start a tournament
  choose NAME PLAYER SPECIES,...         Lock in a team
  pair NAME PLAYER PLAYER                Pair two players for a battle
  result NAME PLAYER win|loss            Report a battle result
  steal NAME PLAYER STOLEN,... SWAPPED,...
                                         Steal from the beaten opponent
  swap NAME PLAYER KEPT,...              Keep handed-over species, redraw the rest
  usage TIER SPECIES                     Print one species' usage entry
  random TIER [SPECIES]                  Roll one candidate outside any tournament

  Species lists are comma separated; use - for an empty list.

OPTIONS:
  --state-file PATH        Snapshot document  [default: env DRAFT_STATE_FILE or data/tournaments.json]
  --seed       N           Draft RNG seed     [default: env DRAFT_SEED or OS entropy]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DRAFT_USAGE_DIR          Directory of <tier>.json usage files
  DRAFT_CUTOFF             Minimum usage weight to be draftable
  DRAFT_SHINY_RATE         Shiny probability, decimal or 1/N
  RUST_LOG                 Log filter (logs go to stderr)
";

struct Args {
    state_file: Option<PathBuf>,
    seed: Option<u64>,
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(ExitCode::SUCCESS);
    }

    let args = Args {
        state_file: pargs.opt_value_from_str("--state-file")?,
        seed: pargs.opt_value_from_str("--seed")?,
        command: pargs
            .finish()
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect(),
    };

    env_logger::builder().format_target(false).init();

    let command = match parse_command(&args.command) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    };

    let config = StoreConfig::from_env(args.state_file, args.seed)?;
    config.validate()?;
    info!("Using snapshot file {}", config.state_file.display());

    let store = TournamentStore::open(
        Arc::new(JsonFileRepository::new(&config.state_file)),
        Arc::new(UsageDirectory::new(&config.usage_dir)),
        StoreOptions {
            generator: config.generator(),
            seed: config.seed,
        },
    )
    .await
    .with_context(|| format!("Failed to open {}", config.state_file.display()))?;

    match run(&store, command).await {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            warn!("Command failed: {err}");
            eprintln!("{}", serde_json::to_string_pretty(&err.report())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Apply one command and render its result
async fn run(store: &TournamentStore, command: Command) -> Result<String, TournamentError> {
    match command {
        Command::Create { name, overrides } => {
            render(&store.create_tournament(&name, overrides).await?)
        }
        Command::List => render(&store.list_tournaments().await),
        Command::Show { name } => render(&store.tournament_snapshot(&name).await?),
        Command::Clear => render(&serde_json::json!({ "removed": store.clear_all().await })),
        Command::Register { name, player } => {
            render(&store.register_player(&name, &player).await?)
        }
        Command::Player { name, player } => render(&store.player_snapshot(&name, &player).await?),
        Command::Start { name } => render(&store.start_tournament(&name).await?),
        Command::Choose {
            name,
            player,
            choices,
        } => render(&store.choose(&name, &player, &choices).await?),
        Command::Pair {
            name,
            first,
            second,
        } => render(&store.pair_for_battle(&name, &first, &second).await?),
        Command::Result { name, player, won } => {
            render(&store.report_result(&name, &player, won).await?)
        }
        Command::Steal {
            name,
            player,
            stolen,
            swapped,
        } => render(&store.steal(&name, &player, &stolen, &swapped).await?),
        Command::Swap { name, player, kept } => {
            render(&store.swap(&name, &player, &kept).await?)
        }
        Command::Usage { tier, species } => render(&store.species_usage(&tier, &species).await?),
        Command::Random { tier, species } => {
            render(&store.random_candidate(&tier, species.as_deref()).await?)
        }
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, TournamentError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TournamentError::CorruptSnapshot(format!("cannot render output: {e}")))
}
