// League records consumed by the engine: players, teams, memberships, sheets.

use serde::{Deserialize, Serialize};

pub type PlayerId = String;
pub type TeamId = String;

/// Number of games recorded per bowler row on a sheet.
pub const GAMES_PER_SHEET: usize = 3;

/// A rostered bowler with cached running values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Running scratch average, refreshed after each sheet save.
    #[serde(default)]
    pub average: f64,
    /// Stored per-game handicap. `None` until first computed or recorded.
    #[serde(default)]
    pub hcp: Option<i64>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            average: 0.0,
            hcp: None,
        }
    }

    /// The stored handicap when it is usable (present and non-negative).
    pub fn stored_handicap(&self) -> Option<u32> {
        self.hcp.and_then(|h| u32::try_from(h).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

/// Join record between a player and a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMembership {
    pub team_id: TeamId,
    pub player_id: PlayerId,
}

/// One bowler's line on a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BowlerRow {
    pub player_id: PlayerId,
    #[serde(default)]
    pub g1: Option<i64>,
    #[serde(default)]
    pub g2: Option<i64>,
    #[serde(default)]
    pub g3: Option<i64>,
    /// Handicap in effect when the sheet was recorded.
    #[serde(default)]
    pub hcp: u32,
}

impl BowlerRow {
    pub fn new(player_id: impl Into<PlayerId>, games: [i64; GAMES_PER_SHEET], hcp: u32) -> Self {
        Self {
            player_id: player_id.into(),
            g1: Some(games[0]),
            g2: Some(games[1]),
            g3: Some(games[2]),
            hcp,
        }
    }

    /// Game `index` (0-based) when it was actually bowled. Missing and
    /// non-positive values are treated as not bowled.
    pub fn game(&self, index: usize) -> Option<u32> {
        let raw = match index {
            0 => self.g1,
            1 => self.g2,
            2 => self.g3,
            _ => None,
        }?;
        if raw > 0 {
            u32::try_from(raw).ok()
        } else {
            None
        }
    }

    /// Bowled games in order, skipping missing ones.
    pub fn bowled_games(&self) -> impl Iterator<Item = u32> + '_ {
        (0..GAMES_PER_SHEET).filter_map(|i| self.game(i))
    }

    /// Sum of the bowled games.
    pub fn scratch_series(&self) -> u64 {
        self.bowled_games().map(u64::from).sum()
    }
}

/// Unique key of a sheet within a league.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetKey {
    pub week: u32,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
}

/// Complete record of one match in one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub week: u32,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    #[serde(default)]
    pub home: Vec<BowlerRow>,
    #[serde(default)]
    pub away: Vec<BowlerRow>,
}

impl Sheet {
    pub fn key(&self) -> SheetKey {
        SheetKey {
            week: self.week,
            home_team_id: self.home_team_id.clone(),
            away_team_id: self.away_team_id.clone(),
        }
    }

    /// Rows aligned by list position, padded with `None` on the shorter side.
    pub fn aligned_rows(&self) -> impl Iterator<Item = (Option<&BowlerRow>, Option<&BowlerRow>)> {
        let len = self.home.len().max(self.away.len());
        (0..len).map(move |i| (self.home.get(i), self.away.get(i)))
    }

    /// Every player with a row on either side.
    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.home.iter().chain(self.away.iter()).map(|r| &r.player_id)
    }
}
