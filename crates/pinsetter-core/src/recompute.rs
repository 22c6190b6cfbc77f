// Refresh of cached player average/handicap after a sheet save.
//
// Planning is pure and returns deltas; the caller persists them. Running the
// plan twice over the same sheet history yields the same values.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::freeze::{in_freeze, past_freeze};
use crate::handicap::compute_from_average;
use crate::league::LeagueConfig;
use crate::sheet::{Player, PlayerId, Sheet};
use crate::stats::compute_player_stats;

/// New cached values for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub player_id: PlayerId,
    pub average: f64,
    pub hcp: Option<i64>,
}

impl PlayerUpdate {
    pub fn apply(&self, player: &mut Player) {
        player.average = self.average;
        player.hcp = self.hcp;
    }

    /// Whether applying this update would change `player`.
    pub fn changes(&self, player: &Player) -> bool {
        player.average != self.average || player.hcp != self.hcp
    }
}

/// Compute cache updates for every player with a row on a sheet of `week`.
///
/// Averages come from all sheets up to and including `week`. The stored
/// handicap is set the first time a player is seen inside the lock window,
/// overwritten on every save once the window has passed, and left alone
/// otherwise.
pub fn plan_recompute(
    config: &LeagueConfig,
    sheets: &[Sheet],
    week: u32,
    players: &[Player],
) -> Vec<PlayerUpdate> {
    plan_recompute_for(config, sheets, week, players, &[])
}

/// Same as [`plan_recompute`], additionally refreshing `dropped`: players
/// whose rows were removed from a sheet of `week` when it was overwritten.
/// A dropped player with no remaining games gets average 0.
pub fn plan_recompute_for(
    config: &LeagueConfig,
    sheets: &[Sheet],
    week: u32,
    players: &[Player],
    dropped: &[PlayerId],
) -> Vec<PlayerUpdate> {
    let affected: HashSet<&PlayerId> = sheets
        .iter()
        .filter(|s| s.week == week)
        .flat_map(|s| s.player_ids())
        .chain(dropped)
        .collect();
    if affected.is_empty() {
        return Vec::new();
    }

    let stats = compute_player_stats(config, sheets, Some(week));
    let frozen = in_freeze(config, week);
    let unlocked = past_freeze(config, week);

    let mut updates = Vec::with_capacity(affected.len());
    for player in players.iter().filter(|p| affected.contains(&p.id)) {
        let average = stats.get(&player.id).map_or(0.0, |s| s.average);
        let hcp = if frozen {
            match player.stored_handicap() {
                Some(_) => player.hcp,
                None => Some(i64::from(compute_from_average(config, average))),
            }
        } else if unlocked {
            Some(i64::from(compute_from_average(config, average)))
        } else {
            player.hcp
        };
        updates.push(PlayerUpdate {
            player_id: player.id.clone(),
            average,
            hcp,
        });
    }

    if updates.len() < affected.len() {
        for id in &affected {
            if !players.iter().any(|p| &p.id == *id) {
                warn!(player = %id, week, "sheet row references unknown player, skipping");
            }
        }
    }

    debug!(week, frozen, unlocked, updates = updates.len(), "planned recompute");
    updates
}

/// Plan and apply the recompute to `players` in place. Returns the applied
/// updates.
pub fn recompute_after_save(
    config: &LeagueConfig,
    sheets: &[Sheet],
    week: u32,
    players: &mut [Player],
) -> Vec<PlayerUpdate> {
    let updates = plan_recompute(config, sheets, week, players);
    for update in &updates {
        if let Some(player) = players.iter_mut().find(|p| p.id == update.player_id) {
            update.apply(player);
        }
    }
    updates
}
