use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::{EnvFilter, prelude::*};

use brass_rs::game::{Game, GameConfig};
use brass_rs::reference::ReferenceData;
use brass_rs::view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    Scoreboard,
    Projected,
    Players,
    Markets,
    Map,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "brass")]
#[command(about = "Create, inspect and save Brass: Birmingham games")]
struct Args {
    /// Comma-separated player names (2 to 4)
    #[arg(long, value_delimiter = ',', default_value = "Player 1,Player 2")]
    players: Vec<String>,

    /// Random seed for shuffling and merchant placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Directory with reference tables; defaults to the built-in board
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Resume from a save file instead of starting a new game
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the game to this file before exiting
    #[arg(long)]
    save: Option<PathBuf>,

    /// Which snapshot to print as JSON
    #[arg(long, value_enum, default_value_t = View::All)]
    view: View,
}

fn main() -> Result<()> {
    init_logging()?;
    let args = Args::parse();

    let game = match &args.load {
        Some(path) => {
            let reference = match &args.data_dir {
                Some(dir) => Arc::new(ReferenceData::load_dir(dir)?),
                None => ReferenceData::shared()?,
            };
            Game::load(path, reference)
                .with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            if args.players.len() < 2 {
                bail!("at least two players are needed, got {:?}", args.players);
            }
            let config = GameConfig {
                player_names: args.players.clone(),
                seed: args.seed,
                data_dir: args.data_dir.clone(),
            };
            Game::new(&config).context("creating game")?
        }
    };
    tracing::info!(id = %game.id, seed = game.seed, "game ready");

    println!("{}", serde_json::to_string_pretty(&snapshot(&game, args.view)?)?);

    if let Some(path) = &args.save {
        game.save(path)
            .with_context(|| format!("saving {}", path.display()))?;
        tracing::info!(path = %path.display(), "game saved");
    }
    Ok(())
}

fn snapshot(game: &Game, selected: View) -> Result<serde_json::Value> {
    let state = &game.state;
    let players = (0..state.player_count())
        .map(|player| view::player_summary(state, player))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match selected {
        View::Scoreboard => serde_json::to_value(view::scoreboard(state))?,
        View::Projected => serde_json::to_value(view::projected_scoreboard(state))?,
        View::Players => serde_json::to_value(players)?,
        View::Markets => serde_json::to_value(view::market_status(state))?,
        View::Map => serde_json::to_value(view::map_occupancy(state))?,
        View::All => json!({
            "id": game.id,
            "turn_order": state.turn_order,
            "scoreboard": view::scoreboard(state),
            "players": players,
            "markets": view::market_status(state),
            "map": view::map_occupancy(state),
        }),
    })
}

fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}
