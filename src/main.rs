//! Binary entrypoint for the lorecrawl CLI.
//!
//! Commands:
//! - `start [--user <id>]` - run an interactive adventure on stdin/stdout
//! - `init` - create a starter `config.toml`
//! - `status` - print store location and known players
//!
//! See the library crate docs for module-level details: `lorecrawl::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use lorecrawl::config::Config;
use lorecrawl::game::mapgen::SchematicRenderer;
use lorecrawl::game::{Engine, GameStore};
use lorecrawl::narrative::{HttpNarrator, Narrator, ScriptedNarrator};

#[derive(Parser)]
#[command(name = "lorecrawl")]
#[command(about = "An AI-narrated text adventure engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive adventure session
    Start {
        /// Player id to load or create
        #[arg(short, long, default_value = "player")]
        user: String,
    },
    /// Initialize a new configuration file
    Init,
    /// Show store status and known players
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start { user } => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting lorecrawl v{}", env!("CARGO_PKG_VERSION"));
            let engine = build_engine(&config)?;
            run_repl(&engine, &user).await?;
        }
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let store = GameStore::open(&config.game.data_dir)?;
            let users = store.list_user_ids()?;
            println!("Data directory: {}", config.game.data_dir);
            println!("Known players: {}", users.len());
            for user in users {
                println!("  - {}", user);
            }
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> Result<Engine> {
    let store = GameStore::open(&config.game.data_dir)?;
    let narrator: Arc<dyn Narrator> = if config.narrative.base_url.is_empty() {
        info!("No narrative endpoint configured; using the offline narrator");
        Arc::new(ScriptedNarrator::new())
    } else {
        Arc::new(HttpNarrator::new(config.narrative.clone()))
    };
    let renderer = Arc::new(SchematicRenderer::default());
    Ok(Engine::new(store, narrator, renderer))
}

/// Line-oriented play loop on stdin/stdout. The first turn is sent with
/// empty input so a fresh character gets the introduction.
async fn run_repl(engine: &Engine, user: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let opening = engine.handle(user, "").await?;
    stdout
        .write_all(format!("{}\n\n> ", opening.text).as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }
        let reply = engine.handle(user, input).await?;
        let mut text = reply.text;
        if let Some(minimap) = reply.minimap {
            text.push_str("\n\n");
            text.push_str(&minimap);
        }
        stdout
            .write_all(format!("{}\n\n> ", text).as_bytes())
            .await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    let _ = builder.try_init();
}
