// SQLite persistence layer for league records, sheets and match results.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use pinsetter_core::{
    normalize_league, LeagueConfig, MatchResult, Player, PlayerUpdate, RawLeagueConfig, Sheet,
    Team, TeamMembership,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::roster::RosterEntry;

/// A league row: identity plus the scoring record as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueRecord {
    pub id: String,
    pub name: String,
    pub raw: RawLeagueConfig,
}

impl LeagueRecord {
    pub fn config(&self) -> LeagueConfig {
        normalize_league(&self.raw)
    }
}

/// Everything the engine needs for one league, read under a single lock.
#[derive(Debug, Clone)]
pub struct LeagueSnapshot {
    pub league: LeagueRecord,
    pub config: LeagueConfig,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub memberships: Vec<TeamMembership>,
    pub sheets: Vec<Sheet>,
    pub matches: Vec<MatchResult>,
}

impl LeagueSnapshot {
    /// Highest week with a saved sheet, 0 when none.
    pub fn latest_week(&self) -> u32 {
        self.sheets.iter().map(|s| s.week).max().unwrap_or(0)
    }
}

/// SQLite-backed persistence. One connection behind a mutex.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS leagues (
                id     TEXT PRIMARY KEY,
                name   TEXT NOT NULL,
                config TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS teams (
                league_id TEXT NOT NULL REFERENCES leagues(id),
                id        TEXT NOT NULL,
                name      TEXT NOT NULL,
                PRIMARY KEY (league_id, id)
            );

            CREATE TABLE IF NOT EXISTS players (
                league_id TEXT NOT NULL REFERENCES leagues(id),
                id        TEXT NOT NULL,
                name      TEXT NOT NULL,
                average   REAL NOT NULL DEFAULT 0,
                hcp       INTEGER,
                PRIMARY KEY (league_id, id)
            );

            CREATE TABLE IF NOT EXISTS memberships (
                seq       INTEGER PRIMARY KEY AUTOINCREMENT,
                league_id TEXT NOT NULL REFERENCES leagues(id),
                team_id   TEXT NOT NULL,
                player_id TEXT NOT NULL,
                UNIQUE(league_id, team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS sheets (
                league_id    TEXT NOT NULL REFERENCES leagues(id),
                week         INTEGER NOT NULL,
                home_team_id TEXT NOT NULL,
                away_team_id TEXT NOT NULL,
                payload      TEXT NOT NULL,
                saved_at     TEXT NOT NULL,
                PRIMARY KEY (league_id, week, home_team_id, away_team_id)
            );

            CREATE TABLE IF NOT EXISTS match_results (
                league_id    TEXT NOT NULL REFERENCES leagues(id),
                week         INTEGER NOT NULL,
                home_team_id TEXT NOT NULL,
                away_team_id TEXT NOT NULL,
                payload      TEXT NOT NULL,
                PRIMARY KEY (league_id, week, home_team_id, away_team_id)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Leagues
    // ------------------------------------------------------------------

    /// Insert or replace a league record. The scoring record is stored as
    /// written and normalized on every read.
    pub fn upsert_league(&self, id: &str, name: &str, raw: &RawLeagueConfig) -> Result<()> {
        let conn = self.conn();
        let config_json = serde_json::to_string(raw).context("failed to serialize league config")?;
        conn.execute(
            "INSERT INTO leagues (id, name, config) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, config = excluded.config",
            params![id, name, config_json],
        )
        .context("failed to upsert league")?;
        Ok(())
    }

    /// Load a league record. Returns `None` if the league does not exist.
    pub fn load_league(&self, id: &str) -> Result<Option<LeagueRecord>> {
        let conn = self.conn();
        load_league_with(&conn, id)
    }

    /// Read every record of a league in one transaction. Returns `None` if
    /// the league does not exist.
    pub fn load_snapshot(&self, league_id: &str) -> Result<Option<LeagueSnapshot>> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin snapshot transaction")?;

        let Some(league) = load_league_with(&tx, league_id)? else {
            return Ok(None);
        };
        let snapshot = LeagueSnapshot {
            config: league.config(),
            teams: load_teams_with(&tx, league_id)?,
            players: load_players_with(&tx, league_id)?,
            memberships: load_memberships_with(&tx, league_id)?,
            sheets: load_sheets_with(&tx, league_id)?,
            matches: load_matches_with(&tx, league_id)?,
            league,
        };
        tx.commit().context("failed to close snapshot transaction")?;
        Ok(Some(snapshot))
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn upsert_team(&self, league_id: &str, team: &Team) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO teams (league_id, id, name) VALUES (?1, ?2, ?3)
             ON CONFLICT(league_id, id) DO UPDATE SET name = excluded.name",
            params![league_id, team.id, team.name],
        )
        .context("failed to upsert team")?;
        Ok(())
    }

    pub fn load_teams(&self, league_id: &str) -> Result<Vec<Team>> {
        load_teams_with(&self.conn(), league_id)
    }

    /// Insert a player or overwrite every field of an existing one.
    pub fn upsert_player(&self, league_id: &str, player: &Player) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO players (league_id, id, name, average, hcp) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(league_id, id) DO UPDATE SET
                name    = excluded.name,
                average = excluded.average,
                hcp     = excluded.hcp",
            params![league_id, player.id, player.name, player.average, player.hcp],
        )
        .context("failed to upsert player")?;
        Ok(())
    }

    pub fn load_players(&self, league_id: &str) -> Result<Vec<Player>> {
        load_players_with(&self.conn(), league_id)
    }

    /// Link a player to a team. Re-adding an existing link is a no-op, so
    /// the first link recorded keeps its position.
    pub fn add_membership(&self, league_id: &str, membership: &TeamMembership) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO memberships (league_id, team_id, player_id) VALUES (?1, ?2, ?3)",
            params![league_id, membership.team_id, membership.player_id],
        )
        .context("failed to add membership")?;
        Ok(())
    }

    pub fn load_memberships(&self, league_id: &str) -> Result<Vec<TeamMembership>> {
        load_memberships_with(&self.conn(), league_id)
    }

    /// Import teams, players and memberships in a single transaction.
    ///
    /// Existing players keep their cached average/handicap unless the entry
    /// supplies a value.
    pub fn import_roster(&self, league_id: &str, entries: &[RosterEntry]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin roster import")?;

        for entry in entries {
            tx.execute(
                "INSERT INTO teams (league_id, id, name) VALUES (?1, ?2, ?3)
                 ON CONFLICT(league_id, id) DO UPDATE SET name = excluded.name",
                params![league_id, entry.team_id, entry.team_name],
            )
            .context("failed to upsert team in roster import")?;

            tx.execute(
                "INSERT INTO players (league_id, id, name, average, hcp)
                 VALUES (?1, ?2, ?3, COALESCE(?4, 0), ?5)
                 ON CONFLICT(league_id, id) DO UPDATE SET
                    name    = excluded.name,
                    average = COALESCE(?4, players.average),
                    hcp     = COALESCE(?5, players.hcp)",
                params![
                    league_id,
                    entry.player_id,
                    entry.player_name,
                    entry.average,
                    entry.hcp
                ],
            )
            .context("failed to upsert player in roster import")?;

            tx.execute(
                "INSERT OR IGNORE INTO memberships (league_id, team_id, player_id)
                 VALUES (?1, ?2, ?3)",
                params![league_id, entry.team_id, entry.player_id],
            )
            .context("failed to add membership in roster import")?;
        }

        tx.commit().context("failed to commit roster import")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sheets
    // ------------------------------------------------------------------

    /// Persist a saved sheet together with its match result and the player
    /// cache updates it triggered. A sheet with the same key is fully
    /// overwritten. All writes commit or none do.
    pub fn commit_sheet(
        &self,
        league_id: &str,
        sheet: &Sheet,
        result: &MatchResult,
        updates: &[PlayerUpdate],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin sheet commit")?;

        let sheet_json = serde_json::to_string(sheet).context("failed to serialize sheet")?;
        let saved_at = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO sheets (league_id, week, home_team_id, away_team_id, payload, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(league_id, week, home_team_id, away_team_id) DO UPDATE SET
                payload  = excluded.payload,
                saved_at = excluded.saved_at",
            params![
                league_id,
                sheet.week,
                sheet.home_team_id,
                sheet.away_team_id,
                sheet_json,
                saved_at
            ],
        )
        .context("failed to save sheet")?;

        let result_json =
            serde_json::to_string(result).context("failed to serialize match result")?;
        tx.execute(
            "INSERT OR REPLACE INTO match_results
                (league_id, week, home_team_id, away_team_id, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                league_id,
                result.key.week,
                result.key.home_team_id,
                result.key.away_team_id,
                result_json
            ],
        )
        .context("failed to save match result")?;

        apply_updates_with(&tx, league_id, updates)?;

        tx.commit().context("failed to commit sheet")?;
        Ok(())
    }

    pub fn load_sheets(&self, league_id: &str) -> Result<Vec<Sheet>> {
        load_sheets_with(&self.conn(), league_id)
    }

    pub fn load_match_results(&self, league_id: &str) -> Result<Vec<MatchResult>> {
        load_matches_with(&self.conn(), league_id)
    }

    /// Timestamp of the last save for a sheet key, if it exists.
    pub fn sheet_saved_at(
        &self,
        league_id: &str,
        week: u32,
        home_team_id: &str,
        away_team_id: &str,
    ) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT saved_at FROM sheets
             WHERE league_id = ?1 AND week = ?2 AND home_team_id = ?3 AND away_team_id = ?4",
            params![league_id, week, home_team_id, away_team_id],
            |row| row.get(0),
        )
        .optional()
        .context("failed to query sheet timestamp")
    }
}

// ---------------------------------------------------------------------------
// Connection-level helpers (shared by single reads and snapshot reads)
// ---------------------------------------------------------------------------

fn load_league_with(conn: &Connection, id: &str) -> Result<Option<LeagueRecord>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT id, name, config FROM leagues WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .context("failed to query league")?;

    match row {
        Some((id, name, config_json)) => {
            let raw: RawLeagueConfig = serde_json::from_str(&config_json)
                .context("failed to deserialize league config")?;
            Ok(Some(LeagueRecord { id, name, raw }))
        }
        None => Ok(None),
    }
}

fn load_teams_with(conn: &Connection, league_id: &str) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM teams WHERE league_id = ?1 ORDER BY rowid")
        .context("failed to prepare load_teams query")?;
    let teams = stmt
        .query_map(params![league_id], |row| {
            Ok(Team {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to query teams")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map team rows")?;
    Ok(teams)
}

fn load_players_with(conn: &Connection, league_id: &str) -> Result<Vec<Player>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, name, average, hcp FROM players WHERE league_id = ?1 ORDER BY rowid",
        )
        .context("failed to prepare load_players query")?;
    let players = stmt
        .query_map(params![league_id], |row| {
            Ok(Player {
                id: row.get(0)?,
                name: row.get(1)?,
                average: row.get(2)?,
                hcp: row.get(3)?,
            })
        })
        .context("failed to query players")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map player rows")?;
    Ok(players)
}

fn load_memberships_with(conn: &Connection, league_id: &str) -> Result<Vec<TeamMembership>> {
    let mut stmt = conn
        .prepare(
            "SELECT team_id, player_id FROM memberships WHERE league_id = ?1 ORDER BY seq",
        )
        .context("failed to prepare load_memberships query")?;
    let memberships = stmt
        .query_map(params![league_id], |row| {
            Ok(TeamMembership {
                team_id: row.get(0)?,
                player_id: row.get(1)?,
            })
        })
        .context("failed to query memberships")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map membership rows")?;
    Ok(memberships)
}

fn load_sheets_with(conn: &Connection, league_id: &str) -> Result<Vec<Sheet>> {
    let mut stmt = conn
        .prepare(
            "SELECT payload FROM sheets WHERE league_id = ?1
             ORDER BY week, home_team_id, away_team_id",
        )
        .context("failed to prepare load_sheets query")?;
    let payloads = stmt
        .query_map(params![league_id], |row| row.get::<_, String>(0))
        .context("failed to query sheets")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map sheet rows")?;

    payloads
        .iter()
        .map(|json| serde_json::from_str(json).context("failed to deserialize sheet"))
        .collect()
}

fn load_matches_with(conn: &Connection, league_id: &str) -> Result<Vec<MatchResult>> {
    let mut stmt = conn
        .prepare(
            "SELECT payload FROM match_results WHERE league_id = ?1
             ORDER BY week, home_team_id, away_team_id",
        )
        .context("failed to prepare load_match_results query")?;
    let payloads = stmt
        .query_map(params![league_id], |row| row.get::<_, String>(0))
        .context("failed to query match results")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map match result rows")?;

    payloads
        .iter()
        .map(|json| serde_json::from_str(json).context("failed to deserialize match result"))
        .collect()
}

fn apply_updates_with(
    tx: &Transaction<'_>,
    league_id: &str,
    updates: &[PlayerUpdate],
) -> Result<()> {
    for update in updates {
        tx.execute(
            "UPDATE players SET average = ?3, hcp = ?4 WHERE league_id = ?1 AND id = ?2",
            params![league_id, update.player_id, update.average, update.hcp],
        )
        .context("failed to update player cache")?;
    }
    Ok(())
}
