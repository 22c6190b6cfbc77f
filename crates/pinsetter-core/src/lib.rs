// Bowling league scoring engine: config normalization, handicaps, points,
// sheet aggregation and standings. Pure functions over caller-owned snapshots.

pub mod freeze;
pub mod handicap;
pub mod league;
pub mod points;
pub mod recompute;
pub mod sheet;
pub mod standings;
pub mod stats;

pub use freeze::{in_freeze, past_freeze};
pub use handicap::{compute_from_average, display_handicap, handicap_for_week};
pub use league::{normalize_league, LeagueConfig, RawLeagueConfig, ScoringMode};
pub use points::{indiv_points, outcome, score_match, team_points, MatchResult, SideResult};
pub use recompute::{plan_recompute, plan_recompute_for, recompute_after_save, PlayerUpdate};
pub use sheet::{BowlerRow, Player, PlayerId, Sheet, SheetKey, Team, TeamId, TeamMembership};
pub use standings::{
    build_standings, team_index, PlayerStanding, Standings, TeamGroup, TeamStanding,
};
pub use stats::{compute_player_stats, PlayerStat};
