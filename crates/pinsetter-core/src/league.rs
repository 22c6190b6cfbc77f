// League configuration: lenient raw record and its normalized form.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_HANDICAP_BASE: f64 = 200.0;
pub const DEFAULT_HANDICAP_PERCENT: f64 = 90.0;
pub const DEFAULT_GAMES_PER_WEEK: u32 = 3;
pub const DEFAULT_HCP_LOCK_FROM_WEEK: f64 = 1.0;
pub const DEFAULT_HCP_LOCK_WEEKS: f64 = 0.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether handicap pins are added to scratch pins for comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    Handicap,
    Scratch,
}

impl ScoringMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringMode::Handicap => "handicap",
            ScoringMode::Scratch => "scratch",
        }
    }
}

/// A league record as it arrives from a store or a config file.
///
/// Every field is optional. Numeric fields accept integers, floats or numeric
/// strings; any other value (booleans, tables, unparseable text) is read as
/// missing so that normalization can fall back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLeagueConfig {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub handicap_base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub handicap_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub games_per_week: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub hcp_lock_from_week: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub hcp_lock_weeks: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub team_points_win: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub team_points_draw: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub indiv_points_win: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub indiv_points_draw: Option<f64>,
}

/// Fully defaulted league configuration. Every numeric field is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueConfig {
    pub mode: ScoringMode,
    pub handicap_base: f64,
    pub handicap_percent: f64,
    pub games_per_week: u32,
    pub hcp_lock_from_week: f64,
    pub hcp_lock_weeks: f64,
    pub team_points_win: f64,
    pub team_points_draw: f64,
    pub indiv_points_win: f64,
    pub indiv_points_draw: f64,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        normalize_league(&RawLeagueConfig::default())
    }
}

impl LeagueConfig {
    pub fn is_scratch(&self) -> bool {
        self.mode == ScoringMode::Scratch
    }
}

impl From<&LeagueConfig> for RawLeagueConfig {
    fn from(config: &LeagueConfig) -> Self {
        RawLeagueConfig {
            mode: Some(config.mode.as_str().to_string()),
            handicap_base: Some(config.handicap_base),
            handicap_percent: Some(config.handicap_percent),
            games_per_week: Some(f64::from(config.games_per_week)),
            hcp_lock_from_week: Some(config.hcp_lock_from_week),
            hcp_lock_weeks: Some(config.hcp_lock_weeks),
            team_points_win: Some(config.team_points_win),
            team_points_draw: Some(config.team_points_draw),
            indiv_points_win: Some(config.indiv_points_win),
            indiv_points_draw: Some(config.indiv_points_draw),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Resolve a raw league record into a usable config. Total and pure: any
/// missing, non-finite or out-of-range field takes its documented default.
pub fn normalize_league(raw: &RawLeagueConfig) -> LeagueConfig {
    let mode = match raw.mode.as_deref() {
        Some("scratch") => ScoringMode::Scratch,
        _ => ScoringMode::Handicap,
    };

    LeagueConfig {
        mode,
        handicap_base: positive_or(raw.handicap_base, DEFAULT_HANDICAP_BASE),
        handicap_percent: positive_or(raw.handicap_percent, DEFAULT_HANDICAP_PERCENT),
        games_per_week: positive_int_or(raw.games_per_week, DEFAULT_GAMES_PER_WEEK),
        hcp_lock_from_week: finite_or(raw.hcp_lock_from_week, DEFAULT_HCP_LOCK_FROM_WEEK),
        hcp_lock_weeks: finite_or(raw.hcp_lock_weeks, DEFAULT_HCP_LOCK_WEEKS),
        team_points_win: finite_or(raw.team_points_win, 0.0),
        team_points_draw: finite_or(raw.team_points_draw, 0.0),
        indiv_points_win: finite_or(raw.indiv_points_win, 0.0),
        indiv_points_draw: finite_or(raw.indiv_points_draw, 0.0),
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

fn positive_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

fn positive_int_or(value: Option<f64>, default: u32) -> u32 {
    match value {
        Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) => {
            v as u32
        }
        _ => default,
    }
}

// ---------------------------------------------------------------------------
// Lenient field deserializers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Number(n) => Some(n),
        LooseValue::Text(s) => s.trim().parse::<f64>().ok(),
        LooseValue::Other(_) => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseValue::deserialize(deserializer)? {
        LooseValue::Text(s) => Some(s),
        _ => None,
    })
}
