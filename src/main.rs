//! Binary entrypoint for the Squirrel Catcher CLI.
//!
//! Commands:
//! - `start` - connect to Discord and run the bot
//! - `init` - write a starter `config.toml`
//! - `status` - print store statistics and the top of the leaderboard
//! - `seed [--file <path>]` - load leaderboard players from JSON
//! - `play --user <id> [--name <name>]` - play from the terminal without Discord
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use squirrel_catcher::bot::BotServer;
use squirrel_catcher::config::Config;
use squirrel_catcher::storage::seed::{apply_seed, load_seed_file};

#[derive(Parser)]
#[command(name = "squirrel-catcher")]
#[command(about = "Catch squirrels, earn acorns, and become the ultimate squirrel wrangler")]
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
    /// Connect to Discord and start the bot
    Start,
    /// Write a default configuration file
    Init,
    /// Show player count, hunters and leaderboard leaders
    Status,
    /// Load leaderboard players from a JSON seed file
    Seed {
        #[arg(short, long, default_value = "data/seeds/leaderboard.json")]
        file: String,
    },
    /// Play in the terminal as the given user id
    Play {
        #[arg(short, long)]
        user: String,
        /// Display name used on the leaderboard
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    match cli.command {
        Commands::Init => {}
        Commands::Start => {
            info!("Starting Squirrel Catcher v{}", env!("CARGO_PKG_VERSION"));
            let server = BotServer::new(config)?;
            server.run().await?;
        }
        Commands::Status => {
            let server = BotServer::new(config)?;
            server.show_status()?;
        }
        Commands::Seed { file } => {
            let server = BotServer::new(config)?;
            let seeds = load_seed_file(&file)?;
            let written = apply_seed(server.engine().store(), &seeds)?;
            info!("Seeded {} players from {}", written, file);
        }
        Commands::Play { user, name } => {
            let server = BotServer::new(config)?;
            server.run_console(&user, name.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    // sled and the HTTP stack are chatty at debug
    builder.filter_module("sled", log::LevelFilter::Warn);
    builder.filter_module("hyper", log::LevelFilter::Warn);
    builder.filter_module("tungstenite", log::LevelFilter::Warn);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(file) => {
            let file = std::sync::Mutex::new(file);
            // Echo to the console only when someone is watching it.
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let line = format!(
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                );
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    }
    let _ = builder.try_init();
}
