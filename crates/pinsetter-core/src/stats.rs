// Per-player stats accumulated from sheet history up to a cutoff week.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::league::LeagueConfig;
use crate::points::{handicap_pins, indiv_points};
use crate::sheet::{BowlerRow, PlayerId, Sheet, GAMES_PER_SHEET};

/// Accumulated stats for one player. Always derived, never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub games_played: u32,
    pub points: f64,
    pub pins_scratch: u64,
    pub pins_handicap: u64,
    pub high_game_scratch: u32,
    pub high_game_handicap: u64,
    pub high_series_scratch: u64,
    pub high_series_handicap: u64,
    /// Scratch average rounded to one decimal place; 0 with no games.
    pub average: f64,
}

impl PlayerStat {
    fn record_game(&mut self, scratch: u32, with_handicap: u64) {
        self.games_played += 1;
        self.pins_scratch += u64::from(scratch);
        self.pins_handicap += with_handicap;
        self.high_game_scratch = self.high_game_scratch.max(scratch);
        self.high_game_handicap = self.high_game_handicap.max(with_handicap);
    }

    fn record_series(&mut self, scratch: u64, with_handicap: u64) {
        self.high_series_scratch = self.high_series_scratch.max(scratch);
        self.high_series_handicap = self.high_series_handicap.max(with_handicap);
    }

    fn finish(&mut self) {
        self.average = if self.games_played == 0 {
            0.0
        } else {
            round_one_decimal(self.pins_scratch as f64 / f64::from(self.games_played))
        };
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Stats for every player with a row on any sheet up to and including
/// `cutoff_week` (`None` means all weeks).
///
/// Rows are paired by list position. A game that is missing or non-positive
/// is skipped for that row only: it does not count as played, does not enter
/// that game's head-to-head comparison, and does not affect the row's other
/// games or its series.
pub fn compute_player_stats(
    config: &LeagueConfig,
    sheets: &[Sheet],
    cutoff_week: Option<u32>,
) -> HashMap<PlayerId, PlayerStat> {
    let mut stats: HashMap<PlayerId, PlayerStat> = HashMap::new();
    let mut counted = 0usize;

    for sheet in sheets
        .iter()
        .filter(|s| cutoff_week.map_or(true, |cutoff| s.week <= cutoff))
    {
        counted += 1;
        for (home, away) in sheet.aligned_rows() {
            accumulate_pair(config, &mut stats, home, away);
        }
    }

    for stat in stats.values_mut() {
        stat.finish();
    }

    debug!(
        sheets = counted,
        players = stats.len(),
        cutoff = ?cutoff_week,
        "computed player stats"
    );
    stats
}

fn accumulate_pair(
    config: &LeagueConfig,
    stats: &mut HashMap<PlayerId, PlayerStat>,
    home: Option<&BowlerRow>,
    away: Option<&BowlerRow>,
) {
    for g in 0..GAMES_PER_SHEET {
        let home_game = home.and_then(|row| row.game(g).map(|pins| (row, pins)));
        let away_game = away.and_then(|row| row.game(g).map(|pins| (row, pins)));

        for (row, pins) in [home_game, away_game].into_iter().flatten() {
            stats
                .entry(row.player_id.clone())
                .or_default()
                .record_game(pins, handicap_pins(config, pins, row.hcp));
        }

        if let (Some((h_row, h_pins)), Some((a_row, a_pins))) = (home_game, away_game) {
            let (h_pts, a_pts) = indiv_points(
                config,
                handicap_pins(config, h_pins, h_row.hcp),
                handicap_pins(config, a_pins, a_row.hcp),
            );
            stats.entry(h_row.player_id.clone()).or_default().points += h_pts;
            stats.entry(a_row.player_id.clone()).or_default().points += a_pts;
        }
    }

    for row in [home, away].into_iter().flatten() {
        let mut scratch = 0u64;
        let mut with_handicap = 0u64;
        let mut bowled = 0;
        for pins in row.bowled_games() {
            bowled += 1;
            scratch += u64::from(pins);
            with_handicap += handicap_pins(config, pins, row.hcp);
        }
        if bowled == 0 {
            continue;
        }
        if let Some(stat) = stats.get_mut(&row.player_id) {
            stat.record_series(scratch, with_handicap);
        }
    }
}
