// Team and player leaderboards as of a given week.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::handicap::display_handicap;
use crate::league::LeagueConfig;
use crate::points::{MatchResult, SideResult};
use crate::sheet::{Player, PlayerId, Team, TeamId, TeamMembership};
use crate::stats::PlayerStat;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub team_id: Option<TeamId>,
    /// Handicap as displayed for the standings week.
    pub handicap: u32,
    pub stat: PlayerStat,
}

/// Players of one team, best first. `team_id` is `None` for players without
/// any membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGroup {
    pub team_id: Option<TeamId>,
    pub team_name: String,
    pub players: Vec<PlayerStanding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub team_name: String,
    pub matches_played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: f64,
    pub indiv_points: f64,
    pub pins_scratch: u64,
    pub pins_handicap: u64,
}

impl TeamStanding {
    fn add_match(&mut self, ours: &SideResult, theirs: &SideResult) {
        self.matches_played += 1;
        match ours.team_points.partial_cmp(&theirs.team_points) {
            Some(Ordering::Greater) => self.wins += 1,
            Some(Ordering::Less) => self.losses += 1,
            _ => self.draws += 1,
        }
        self.points += ours.team_points;
        self.indiv_points += ours.indiv_points;
        self.pins_scratch += ours.scratch_series;
        self.pins_handicap += ours.series_pins;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub as_of_week: u32,
    pub teams: Vec<TeamStanding>,
    pub players: Vec<TeamGroup>,
}

// ---------------------------------------------------------------------------
// Membership resolution
// ---------------------------------------------------------------------------

/// Map each player to a single team. The first membership seen for a player
/// wins; later ones are ignored.
pub fn team_index(memberships: &[TeamMembership]) -> HashMap<PlayerId, TeamId> {
    let mut index = HashMap::new();
    for m in memberships {
        index
            .entry(m.player_id.clone())
            .or_insert_with(|| m.team_id.clone());
    }
    index
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build both leaderboards.
///
/// `stats` should come from sheets up to `as_of_week`; `matches` may contain
/// later weeks and is filtered here. Team points are taken from the stored
/// match results, never recomputed.
pub fn build_standings(
    config: &LeagueConfig,
    as_of_week: u32,
    players: &[Player],
    teams: &[Team],
    memberships: &[TeamMembership],
    stats: &HashMap<PlayerId, PlayerStat>,
    matches: &[MatchResult],
) -> Standings {
    Standings {
        as_of_week,
        teams: team_leaderboard(as_of_week, teams, matches),
        players: player_leaderboard(config, as_of_week, players, teams, memberships, stats),
    }
}

/// Team totals from match results up to `as_of_week`, most points first.
/// Equal points fall back to team name so output is deterministic.
pub fn team_leaderboard(
    as_of_week: u32,
    teams: &[Team],
    matches: &[MatchResult],
) -> Vec<TeamStanding> {
    let mut rows: Vec<TeamStanding> = teams
        .iter()
        .map(|t| TeamStanding {
            team_id: t.id.clone(),
            team_name: t.name.clone(),
            ..TeamStanding::default()
        })
        .collect();
    let mut position: HashMap<TeamId, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.team_id.clone(), i))
        .collect();

    for result in matches.iter().filter(|m| m.week() <= as_of_week) {
        for (ours, theirs) in [(&result.home, &result.away), (&result.away, &result.home)] {
            let idx = *position.entry(ours.team_id.clone()).or_insert_with(|| {
                rows.push(TeamStanding {
                    team_id: ours.team_id.clone(),
                    team_name: ours.team_id.clone(),
                    ..TeamStanding::default()
                });
                rows.len() - 1
            });
            rows[idx].add_match(ours, theirs);
        }
    }

    rows.sort_by(|a, b| {
        b.points
            .partial_cmp(&a.points)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    rows
}

/// Players grouped by team (in `teams` order, unassigned last), sorted within
/// each group by points, then handicap pins, then name.
pub fn player_leaderboard(
    config: &LeagueConfig,
    as_of_week: u32,
    players: &[Player],
    teams: &[Team],
    memberships: &[TeamMembership],
    stats: &HashMap<PlayerId, PlayerStat>,
) -> Vec<TeamGroup> {
    let index = team_index(memberships);

    let mut groups: Vec<TeamGroup> = teams
        .iter()
        .map(|t| TeamGroup {
            team_id: Some(t.id.clone()),
            team_name: t.name.clone(),
            players: Vec::new(),
        })
        .collect();
    let mut unassigned = TeamGroup {
        team_id: None,
        team_name: String::new(),
        players: Vec::new(),
    };

    let mut standings: Vec<PlayerStanding> = players
        .iter()
        .map(|p| {
            let stat = stats.get(&p.id).cloned().unwrap_or_default();
            PlayerStanding {
                player_id: p.id.clone(),
                name: p.name.clone(),
                team_id: index.get(&p.id).cloned(),
                handicap: display_handicap(config, as_of_week, p, stat.average),
                stat,
            }
        })
        .collect();

    // Players who bowled but are missing from the roster still get a line.
    let mut orphans: Vec<(&PlayerId, &PlayerStat)> = stats
        .iter()
        .filter(|(id, _)| !players.iter().any(|p| &p.id == *id))
        .collect();
    orphans.sort_by(|a, b| a.0.cmp(b.0));
    for (id, stat) in orphans {
        let placeholder = Player::new(id.clone(), id.clone());
        standings.push(PlayerStanding {
            player_id: id.clone(),
            name: id.clone(),
            team_id: index.get(id).cloned(),
            handicap: display_handicap(config, as_of_week, &placeholder, stat.average),
            stat: stat.clone(),
        });
    }

    for standing in standings {
        let group = standing
            .team_id
            .as_ref()
            .and_then(|tid| groups.iter_mut().find(|g| g.team_id.as_ref() == Some(tid)));
        match group {
            Some(g) => g.players.push(standing),
            None => unassigned.players.push(standing),
        }
    }

    if !unassigned.players.is_empty() {
        groups.push(unassigned);
    }
    for group in &mut groups {
        group.players.sort_by(compare_players);
    }
    groups
}

fn compare_players(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    b.stat
        .points
        .partial_cmp(&a.stat.points)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.stat.pins_handicap.cmp(&a.stat.pins_handicap))
        .then_with(|| a.name.cmp(&b.name))
}
