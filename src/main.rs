//! Command-line entry point for the skill ladder
//!
//! Loads configuration, opens the ladder (remote store first, local files
//! as fallback) and runs a single command against it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use skill_ladder::config::{validate_config, AppConfig};
use skill_ladder::LadderService;
use std::path::PathBuf;
use tracing::{error, info};

/// Skill Ladder - TrueSkill rankings for free-for-all games
#[derive(Parser)]
#[command(
    name = "skill-ladder",
    version,
    about = "Track TrueSkill ratings for a free-for-all game",
    long_about = "Skill Ladder records finishing orders of free-for-all matches, updates every \
                 participant's TrueSkill rating, and keeps the full rating history in a remote \
                 versioned file store with local files as a fallback."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Override the local data directory")]
    data_dir: Option<PathBuf>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without opening the ladder")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the leaderboard
    Ratings,
    /// Add a new player at the default rating
    AddPlayer {
        /// Player name (case-sensitive)
        name: String,
    },
    /// Record a match, winner first
    RecordMatch {
        /// Player names in finishing order
        #[arg(required = true, num_args = 2..)]
        players: Vec<String>,
    },
    /// Show a player's rating history
    History {
        /// Player name
        name: String,
    },
    /// Predict a head-to-head game
    Predict { first: String, second: String },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    validate_config(&config)?;
    Ok(config)
}

fn display_config(config: &AppConfig) {
    info!("Skill Ladder {}", skill_ladder::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Data dir: {}", config.storage.data_dir.display());
    match config.storage.remote_credentials() {
        Some(remote) => info!(
            "   Remote store: {}/{} ({})",
            remote.owner, remote.repository, remote.branch
        ),
        None => info!("   Remote store: disabled"),
    }
    info!(
        "   Prior: mu={:.2}, sigma={:.2}, beta={:.2}, tau={:.4}",
        config.rating.initial_mu,
        config.rating.initial_sigma,
        config.rating.beta(),
        config.rating.tau()
    );
}

fn print_leaderboard(ladder: &LadderService) {
    println!(
        "{:>4}  {:<20} {:>8} {:>8} {:>8}",
        "#", "Player", "Score", "Mu", "Sigma"
    );
    for row in ladder.leaderboard() {
        println!(
            "{:>4}  {:<20} {:>8.2} {:>8.2} {:>8.2}",
            row.position, row.name, row.conservative, row.mu, row.sigma
        );
    }
}

async fn run(ladder: &mut LadderService, command: Command) -> Result<()> {
    match command {
        Command::Ratings => print_leaderboard(ladder),
        Command::AddPlayer { name } => {
            let rating = ladder.add_player(&name).await?;
            println!(
                "Added {} (mu {:.2}, sigma {:.2})",
                name, rating.mu, rating.sigma
            );
        }
        Command::RecordMatch { players } => {
            let report = ladder.record_match(players).await?;
            for change in &report.changes {
                println!(
                    "{:>2}. {:<20} mu {:>6.2} ({:+.2})  sigma {:>5.2} ({:+.2})",
                    change.rank + 1,
                    change.name,
                    change.new_rating.mu,
                    change.mu_delta(),
                    change.new_rating.sigma,
                    change.sigma_delta()
                );
            }
            println!();
            print_leaderboard(ladder);
        }
        Command::History { name } => {
            for (timestamp, rating) in ladder.get_history(&name)? {
                println!(
                    "{}  mu {:>6.2}  sigma {:>5.2}  score {:>6.2}",
                    timestamp.to_rfc3339(),
                    rating.mu,
                    rating.sigma,
                    rating.conservative_score()
                );
            }
        }
        Command::Predict { first, second } => {
            let prediction = ladder.head_to_head(&first, &second)?;
            println!(
                "{} beats {}: {:.1}% (match quality {:.1}%)",
                first,
                second,
                prediction.win_probability * 100.0,
                prediction.match_quality * 100.0
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_config(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        return Ok(());
    }

    let mut ladder = match LadderService::from_config(&config).await {
        Ok(ladder) => ladder,
        Err(e) => {
            error!("Failed to open ladder: {}", e);
            std::process::exit(1);
        }
    };

    let command = args.command.unwrap_or(Command::Ratings);
    if let Err(e) = run(&mut ladder, command).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}
