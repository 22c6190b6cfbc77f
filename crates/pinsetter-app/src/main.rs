// Pinsetter entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config, copying defaults on first run
// 3. Open database and register the configured league
// 4. Run the requested command

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pinsetter_app::config;
use pinsetter_app::report;
use pinsetter_app::roster;
use pinsetter_app::service::LeagueService;
use pinsetter_app::store::Database;
use pinsetter_core::Sheet;
use tracing::info;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import teams, players and memberships from a roster CSV
    ImportRoster {
        /// Path to the roster CSV
        path: PathBuf,
    },
    /// Print a blank sheet for a fixture with handicaps filled in
    NewSheet {
        #[arg(long)]
        week: u32,
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        /// Write the sheet to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Save a completed sheet (JSON), score it and refresh handicaps
    SaveSheet {
        /// Path to the sheet JSON
        path: PathBuf,
    },
    /// Per-bowler statistics
    Stats {
        /// Only count sheets up to this week
        #[arg(long)]
        week: Option<u32>,
    },
    /// Team and bowler standings
    Standings {
        /// Standings as of this week (defaults to the latest saved week)
        #[arg(long)]
        week: Option<u32>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "pinsetter")]
#[command(about = "Bowling league scoring, handicaps and standings", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding config/, defaults/ and logs/
    #[arg(short, long, global = true, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.base_dir)?;
    info!("pinsetter starting");

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    let league_id = config.league.id.clone();
    info!(league = %league_id, mode = config.league.scoring.mode.as_str(), "config loaded");

    let db_path = resolve_db_path(&cli.base_dir, &config.db_path);
    let db = Database::open(&db_path).context("failed to open database")?;
    let service = LeagueService::new(db);
    service.ensure_league(&config.league)?;

    match cli.command {
        Commands::ImportRoster { path } => {
            let entries = roster::load_roster(&path)?;
            service.import_roster(&league_id, &entries)?;
            println!("Imported {} roster entries.", entries.len());
        }
        Commands::NewSheet {
            week,
            home,
            away,
            out,
        } => {
            let sheet = service.new_sheet(&league_id, week, &home, &away)?;
            let json = serde_json::to_string_pretty(&sheet).context("failed to serialize sheet")?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::SaveSheet { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let sheet: Sheet = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse sheet {}", path.display()))?;
            let outcome = service.save_sheet(&league_id, sheet)?;
            print!("{}", report::format_save_outcome(&outcome));
        }
        Commands::Stats { week } => {
            let stats = service.player_stats(&league_id, week)?;
            println!("{}", report::format_player_stats(&stats.stats, &stats.players));
        }
        Commands::Standings { week, json } => {
            let standings = service.standings(&league_id, week)?;
            if json {
                let text = serde_json::to_string_pretty(&standings)
                    .context("failed to serialize standings")?;
                println!("{text}");
            } else {
                print!("{}", report::format_standings(&standings));
            }
        }
    }

    info!("pinsetter finished");
    Ok(())
}

/// Relative database paths are resolved against the base directory.
fn resolve_db_path(base_dir: &Path, db_path: &str) -> String {
    if db_path == ":memory:" || Path::new(db_path).is_absolute() {
        db_path.to_string()
    } else {
        base_dir.join(db_path).display().to_string()
    }
}

fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("pinsetter.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pinsetter=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
