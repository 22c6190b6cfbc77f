// Per-game handicap: raw formula, the value recorded on new sheet rows, and
// the value shown in read-only views.
//
// Recording and display follow different policies over the same inputs and
// are kept as separate functions.

use tracing::trace;

use crate::freeze::in_freeze;
use crate::league::LeagueConfig;
use crate::sheet::Player;

/// `max(0, round((base - average) * percent / 100))`, or 0 in scratch mode.
///
/// Halves round up. A non-finite average is read as 0.
pub fn compute_from_average(config: &LeagueConfig, average: f64) -> u32 {
    if config.is_scratch() {
        return 0;
    }
    let average = if average.is_finite() { average } else { 0.0 };
    let raw = (config.handicap_base - average) * config.handicap_percent / 100.0;
    let rounded = (raw + 0.5).floor();
    if rounded <= 0.0 {
        0
    } else {
        rounded.min(f64::from(u32::MAX)) as u32
    }
}

/// Handicap to record on a new sheet row for `player` in `week`.
///
/// A usable stored handicap always wins, whatever the lock window says;
/// otherwise the value is computed from the player's current average.
pub fn handicap_for_week(config: &LeagueConfig, week: u32, player: &Player) -> u32 {
    match player.stored_handicap() {
        Some(stored) => {
            trace!(player = %player.id, week, stored, "recording stored handicap");
            stored
        }
        None => compute_from_average(config, player.average),
    }
}

/// Handicap to show for `player` as of `as_of_week`, given their average over
/// sheets up to that week.
///
/// Inside the lock window a usable stored handicap is shown; in every other
/// case the value is recomputed from `average_as_of_week`.
pub fn display_handicap(
    config: &LeagueConfig,
    as_of_week: u32,
    player: &Player,
    average_as_of_week: f64,
) -> u32 {
    if in_freeze(config, as_of_week) {
        if let Some(stored) = player.stored_handicap() {
            return stored;
        }
    }
    compute_from_average(config, average_as_of_week)
}
