// Win/draw/loss point allocation and per-sheet match scoring.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::league::LeagueConfig;
use crate::sheet::{BowlerRow, Sheet, SheetKey, TeamId, GAMES_PER_SHEET};

/// Split points between two comparable values.
///
/// Equal values draw, otherwise the larger side takes `win_pts` and the
/// other side takes nothing.
pub fn outcome<T: PartialOrd>(a: T, b: T, win_pts: f64, draw_pts: f64) -> (f64, f64) {
    if a == b {
        (draw_pts, draw_pts)
    } else if a > b {
        (win_pts, 0.0)
    } else {
        (0.0, win_pts)
    }
}

/// Team-level outcome using the league's team point values.
pub fn team_points(config: &LeagueConfig, pins_a: u64, pins_b: u64) -> (f64, f64) {
    outcome(pins_a, pins_b, config.team_points_win, config.team_points_draw)
}

/// Head-to-head outcome using the league's individual point values.
pub fn indiv_points(config: &LeagueConfig, pins_a: u64, pins_b: u64) -> (f64, f64) {
    outcome(pins_a, pins_b, config.indiv_points_win, config.indiv_points_draw)
}

/// Pins for one game with the row's handicap added, unless the league bowls
/// scratch.
pub(crate) fn handicap_pins(config: &LeagueConfig, pins: u32, hcp: u32) -> u64 {
    if config.is_scratch() {
        u64::from(pins)
    } else {
        u64::from(pins) + u64::from(hcp)
    }
}

// ---------------------------------------------------------------------------
// Match scoring
// ---------------------------------------------------------------------------

/// One side's totals for a scored sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideResult {
    pub team_id: TeamId,
    /// Scratch pins per game.
    pub scratch_game_pins: [u64; GAMES_PER_SHEET],
    /// Pins per game as compared: scratch plus handicap unless scratch mode.
    pub game_pins: [u64; GAMES_PER_SHEET],
    pub scratch_series: u64,
    /// Series as compared: scratch series plus `hcp * games_per_week` per
    /// bowler unless scratch mode.
    pub series_pins: u64,
    /// Sum of the three per-game and the series team outcomes.
    pub team_points: f64,
    /// Sum of this side's individual head-to-head outcomes.
    pub indiv_points: f64,
}

impl SideResult {
    fn new(team_id: &TeamId) -> Self {
        Self {
            team_id: team_id.clone(),
            scratch_game_pins: [0; GAMES_PER_SHEET],
            game_pins: [0; GAMES_PER_SHEET],
            scratch_series: 0,
            series_pins: 0,
            team_points: 0.0,
            indiv_points: 0.0,
        }
    }

    fn total_rows(&mut self, config: &LeagueConfig, rows: &[BowlerRow]) {
        for row in rows {
            let mut bowled_any = false;
            for g in 0..GAMES_PER_SHEET {
                if let Some(pins) = row.game(g) {
                    bowled_any = true;
                    self.scratch_game_pins[g] += u64::from(pins);
                    self.game_pins[g] += handicap_pins(config, pins, row.hcp);
                }
            }
            if !bowled_any {
                continue;
            }
            let scratch = row.scratch_series();
            self.scratch_series += scratch;
            self.series_pins += if config.is_scratch() {
                scratch
            } else {
                scratch + u64::from(row.hcp) * u64::from(config.games_per_week)
            };
        }
    }
}

/// Team and individual totals for one sheet, computed once when the sheet is
/// saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub key: SheetKey,
    pub home: SideResult,
    pub away: SideResult,
}

impl MatchResult {
    pub fn week(&self) -> u32 {
        self.key.week
    }
}

/// Score a sheet: three per-game team comparisons, one series comparison,
/// and positional head-to-head comparisons between bowler rows.
pub fn score_match(config: &LeagueConfig, sheet: &Sheet) -> MatchResult {
    let mut home = SideResult::new(&sheet.home_team_id);
    let mut away = SideResult::new(&sheet.away_team_id);
    home.total_rows(config, &sheet.home);
    away.total_rows(config, &sheet.away);

    for g in 0..GAMES_PER_SHEET {
        let (h, a) = team_points(config, home.game_pins[g], away.game_pins[g]);
        home.team_points += h;
        away.team_points += a;
    }
    let (h, a) = team_points(config, home.series_pins, away.series_pins);
    home.team_points += h;
    away.team_points += a;

    for (home_row, away_row) in sheet.aligned_rows() {
        let (Some(home_row), Some(away_row)) = (home_row, away_row) else {
            continue;
        };
        for g in 0..GAMES_PER_SHEET {
            if let (Some(hp), Some(ap)) = (home_row.game(g), away_row.game(g)) {
                let (h, a) = indiv_points(
                    config,
                    handicap_pins(config, hp, home_row.hcp),
                    handicap_pins(config, ap, away_row.hcp),
                );
                home.indiv_points += h;
                away.indiv_points += a;
            }
        }
    }

    debug!(
        week = sheet.week,
        home = %sheet.home_team_id,
        away = %sheet.away_team_id,
        home_points = home.team_points,
        away_points = away.team_points,
        "scored match"
    );

    MatchResult {
        key: sheet.key(),
        home,
        away,
    }
}
