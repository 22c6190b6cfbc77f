// Roster CSV loading.
//
// One row per team membership:
//   team_id,team_name,player_id,player_name,average,hcp
// The last two columns are optional and seed the player cache on first import.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

/// One validated roster line.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub team_id: String,
    pub team_name: String,
    pub player_id: String,
    pub player_name: String,
    pub average: Option<f64>,
    pub hcp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawRosterRow {
    team_id: String,
    #[serde(default)]
    team_name: String,
    player_id: String,
    #[serde(default)]
    player_name: String,
    #[serde(default)]
    average: Option<f64>,
    #[serde(default)]
    hcp: Option<i64>,
}

/// Parse roster rows from any reader. Malformed rows are logged and skipped.
pub fn load_roster_from_reader<R: Read>(rdr: R) -> Result<Vec<RosterEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawRosterRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed roster row: {}", e);
                continue;
            }
        };
        if raw.team_id.is_empty() || raw.player_id.is_empty() {
            warn!("skipping roster row with empty team or player id");
            continue;
        }
        let average = match raw.average {
            Some(avg) if !avg.is_finite() || avg < 0.0 => {
                warn!("ignoring invalid average for '{}'", raw.player_id);
                None
            }
            other => other,
        };
        let hcp = match raw.hcp {
            Some(h) if h < 0 => {
                warn!("ignoring negative handicap for '{}'", raw.player_id);
                None
            }
            other => other,
        };
        entries.push(RosterEntry {
            team_name: if raw.team_name.is_empty() {
                raw.team_id.clone()
            } else {
                raw.team_name
            },
            player_name: if raw.player_name.is_empty() {
                raw.player_id.clone()
            } else {
                raw.player_name
            },
            team_id: raw.team_id,
            player_id: raw.player_id,
            average,
            hcp,
        });
    }
    Ok(entries)
}

/// Load a roster CSV from disk.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, RosterError> {
    let path_str = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| RosterError::Io {
        path: path_str.clone(),
        source: e,
    })?;
    let entries = load_roster_from_reader(file).map_err(|e| RosterError::Csv {
        path: path_str.clone(),
        source: e,
    })?;
    info!("loaded {} roster entries from {}", entries.len(), path_str);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_with_optional_columns() {
        let csv = "\
team_id,team_name,player_id,player_name,average,hcp
t1,Alley Cats,p1,Pat Jones,171.5,26
t1,Alley Cats,p2,Lee Smith,,
t2,Gutter Gang,p3,Sam Lee,150,
";
        let entries = load_roster_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].average, Some(171.5));
        assert_eq!(entries[0].hcp, Some(26));
        assert_eq!(entries[1].average, None);
        assert_eq!(entries[1].hcp, None);
        assert_eq!(entries[2].team_name, "Gutter Gang");
        assert_eq!(entries[2].average, Some(150.0));
    }

    #[test]
    fn skips_malformed_and_blank_id_rows() {
        let csv = "\
team_id,team_name,player_id,player_name,average,hcp
t1,Alley Cats,p1,Pat,abc,
,Nobody,p2,Lee,,
t1,Alley Cats,,Ghost,,
t1,Alley Cats,p3,Sam,160,
";
        let entries = load_roster_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player_id, "p3");
    }

    #[test]
    fn invalid_cache_values_are_dropped_not_fatal() {
        let csv = "\
team_id,team_name,player_id,player_name,average,hcp
t1,,p1,,-5,-3
";
        let entries = load_roster_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].team_name, "t1");
        assert_eq!(entries[0].player_name, "p1");
        assert_eq!(entries[0].average, None);
        assert_eq!(entries[0].hcp, None);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_roster(Path::new("/nonexistent/roster.csv")).unwrap_err();
        assert!(matches!(err, RosterError::Io { .. }));
    }
}
