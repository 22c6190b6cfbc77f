// League operations over the store: sheet save with scoring and recompute,
// snapshot reads for stats and standings, roster import.
//
// Saves for one league run inside that league's critical section. Different
// leagues never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pinsetter_core::{
    build_standings, compute_player_stats, handicap_for_week, plan_recompute_for, score_match,
    BowlerRow, MatchResult, Player, PlayerId, PlayerStat, PlayerUpdate, Sheet, Standings,
};
use tracing::{debug, info};

use crate::config::LeagueSettings;
use crate::roster::RosterEntry;
use crate::store::{Database, LeagueSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("league not found: {0}")]
    LeagueNotFound(String),

    #[error("unknown team `{team_id}` in league {league_id}")]
    UnknownTeam { league_id: String, team_id: String },

    #[error("invalid sheet: {0}")]
    InvalidSheet(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What a sheet save did.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub result: MatchResult,
    /// Player cache changes written with the sheet.
    pub updates: Vec<PlayerUpdate>,
    /// Whether a sheet with the same key was overwritten.
    pub replaced: bool,
    /// When the overwritten sheet was last saved (RFC 3339).
    pub previous_saved_at: Option<String>,
}

/// Player stats together with the roster they were read with.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub cutoff: Option<u32>,
    pub stats: HashMap<PlayerId, PlayerStat>,
    pub players: Vec<Player>,
}

pub struct LeagueService {
    db: Database,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LeagueService {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Register or refresh the league record from config.
    pub fn ensure_league(&self, settings: &LeagueSettings) -> Result<(), ServiceError> {
        self.db
            .upsert_league(&settings.id, &settings.name, &settings.raw)?;
        debug!(league = %settings.id, "league record up to date");
        Ok(())
    }

    /// Consistent read of every record of a league.
    pub fn snapshot(&self, league_id: &str) -> Result<LeagueSnapshot, ServiceError> {
        self.db
            .load_snapshot(league_id)?
            .ok_or_else(|| ServiceError::LeagueNotFound(league_id.to_string()))
    }

    pub fn import_roster(
        &self,
        league_id: &str,
        entries: &[RosterEntry],
    ) -> Result<(), ServiceError> {
        if self.db.load_league(league_id)?.is_none() {
            return Err(ServiceError::LeagueNotFound(league_id.to_string()));
        }
        self.db.import_roster(league_id, entries)?;
        info!(league = league_id, entries = entries.len(), "roster imported");
        Ok(())
    }

    /// Blank sheet for a fixture: one row per team member in membership
    /// order, each carrying the handicap that applies for `week`.
    pub fn new_sheet(
        &self,
        league_id: &str,
        week: u32,
        home_team_id: &str,
        away_team_id: &str,
    ) -> Result<Sheet, ServiceError> {
        let snapshot = self.snapshot(league_id)?;
        check_fixture(&snapshot, week, home_team_id, away_team_id)?;

        let rows_for = |team_id: &str| -> Vec<BowlerRow> {
            snapshot
                .memberships
                .iter()
                .filter(|m| m.team_id == team_id)
                .filter_map(|m| snapshot.players.iter().find(|p| p.id == m.player_id))
                .map(|player| BowlerRow {
                    player_id: player.id.clone(),
                    g1: None,
                    g2: None,
                    g3: None,
                    hcp: handicap_for_week(&snapshot.config, week, player),
                })
                .collect()
        };

        Ok(Sheet {
            week,
            home_team_id: home_team_id.to_string(),
            away_team_id: away_team_id.to_string(),
            home: rows_for(home_team_id),
            away: rows_for(away_team_id),
        })
    }

    /// Save a sheet, score the match and refresh the player cache, all as
    /// one critical section per league and one store transaction.
    pub fn save_sheet(&self, league_id: &str, sheet: Sheet) -> Result<SaveOutcome, ServiceError> {
        let lock = self.league_lock(league_id);
        let _guard = lock.lock().expect("league lock poisoned");

        let mut snapshot = self.snapshot(league_id)?;
        check_fixture(&snapshot, sheet.week, &sheet.home_team_id, &sheet.away_team_id)?;

        let key = sheet.key();
        // Players on the version being replaced must be refreshed even if
        // the new version no longer lists them.
        let dropped: Vec<PlayerId> = snapshot
            .sheets
            .iter()
            .filter(|s| s.key() == key)
            .flat_map(|s| s.player_ids().cloned())
            .collect();
        let before = snapshot.sheets.len();
        snapshot.sheets.retain(|s| s.key() != key);
        let replaced = snapshot.sheets.len() != before;
        let previous_saved_at = if replaced {
            self.db
                .sheet_saved_at(league_id, key.week, &key.home_team_id, &key.away_team_id)?
        } else {
            None
        };

        let result = score_match(&snapshot.config, &sheet);
        snapshot.sheets.push(sheet.clone());

        let mut updates = plan_recompute_for(
            &snapshot.config,
            &snapshot.sheets,
            key.week,
            &snapshot.players,
            &dropped,
        );
        updates.retain(|u| {
            snapshot
                .players
                .iter()
                .find(|p| p.id == u.player_id)
                .is_some_and(|p| u.changes(p))
        });

        self.db.commit_sheet(league_id, &sheet, &result, &updates)?;

        info!(
            league = league_id,
            week = key.week,
            home = %key.home_team_id,
            away = %key.away_team_id,
            replaced,
            home_points = result.home.team_points,
            away_points = result.away.team_points,
            updates = updates.len(),
            "sheet saved"
        );

        Ok(SaveOutcome {
            result,
            updates,
            replaced,
            previous_saved_at,
        })
    }

    /// Per-player totals over sheets up to `cutoff` (all sheets when `None`),
    /// read from one snapshot along with the roster.
    pub fn player_stats(
        &self,
        league_id: &str,
        cutoff: Option<u32>,
    ) -> Result<StatsReport, ServiceError> {
        let snapshot = self.snapshot(league_id)?;
        Ok(StatsReport {
            cutoff,
            stats: compute_player_stats(&snapshot.config, &snapshot.sheets, cutoff),
            players: snapshot.players,
        })
    }

    /// Leaderboards as of `as_of_week`, defaulting to the latest saved week.
    pub fn standings(
        &self,
        league_id: &str,
        as_of_week: Option<u32>,
    ) -> Result<Standings, ServiceError> {
        let snapshot = self.snapshot(league_id)?;
        let as_of = as_of_week.unwrap_or_else(|| snapshot.latest_week());
        let stats = compute_player_stats(&snapshot.config, &snapshot.sheets, Some(as_of));
        Ok(build_standings(
            &snapshot.config,
            as_of,
            &snapshot.players,
            &snapshot.teams,
            &snapshot.memberships,
            &stats,
            &snapshot.matches,
        ))
    }

    fn league_lock(&self, league_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("league lock table poisoned");
        Arc::clone(locks.entry(league_id.to_string()).or_default())
    }
}

fn check_fixture(
    snapshot: &LeagueSnapshot,
    week: u32,
    home_team_id: &str,
    away_team_id: &str,
) -> Result<(), ServiceError> {
    if week == 0 {
        return Err(ServiceError::InvalidSheet("week numbers start at 1".into()));
    }
    if home_team_id == away_team_id {
        return Err(ServiceError::InvalidSheet(format!(
            "team `{home_team_id}` cannot play itself"
        )));
    }
    for team_id in [home_team_id, away_team_id] {
        if !snapshot.teams.iter().any(|t| t.id == team_id) {
            return Err(ServiceError::UnknownTeam {
                league_id: snapshot.league.id.clone(),
                team_id: team_id.to_string(),
            });
        }
    }
    Ok(())
}
