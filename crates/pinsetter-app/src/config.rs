// Configuration loading and parsing (config/league.toml).

use std::path::{Path, PathBuf};

use pinsetter_core::{normalize_league, LeagueConfig, RawLeagueConfig};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

const LEAGUE_FILE: &str = "league.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueSettings,
    pub db_path: String,
}

/// The `[league]` table: identity plus the scoring record as written.
#[derive(Debug, Clone)]
pub struct LeagueSettings {
    pub id: String,
    pub name: String,
    /// Scoring fields exactly as read; stored so the league record keeps
    /// whatever the operator wrote.
    pub raw: RawLeagueConfig,
    /// Normalized view of `raw`.
    pub scoring: LeagueConfig,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    league: LeagueSection,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct LeagueSection {
    id: String,
    name: String,
    #[serde(flatten)]
    scoring: RawLeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` relative to
/// `base_dir`. Does not copy defaults; see `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(LEAGUE_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let scoring = normalize_league(&file.league.scoring);
    let config = Config {
        league: LeagueSettings {
            id: file.league.id.trim().to_string(),
            name: file.league.name.trim().to_string(),
            raw: file.league.scoring,
            scoring,
        },
        db_path: file.database.path.trim().to_string(),
    };

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/league.toml` to `config/league.toml` unless the latter
/// already exists. Returns the path written, if any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(LEAGUE_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(LEAGUE_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {LEAGUE_FILE} in config/ or defaults/ under {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    std::fs::create_dir_all(base_dir.join("config")).map_err(copy_err)?;
    std::fs::copy(&source, &target).map_err(copy_err)?;
    info!("created {} from defaults", target.display());

    Ok(Some(target))
}

/// Load config relative to `base_dir`, copying defaults first.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// Only identity and infrastructure fields can fail. Scoring fields always
// normalize.
fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.id.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.id".into(),
            message: "must not be empty".into(),
        });
    }
    if config.league.name.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }
    if config.db_path.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
