// Plain-text tables for the CLI.

use std::collections::HashMap;

use pinsetter_core::{Player, PlayerId, PlayerStat, Standings, TeamStanding};

use crate::service::SaveOutcome;

/// Format points without a trailing ".0" (2, 1.5).
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points}")
    }
}

/// Team leaderboard followed by each team's players.
pub fn format_standings(standings: &Standings) -> String {
    let mut out = format!("Standings after week {}\n\n", standings.as_of_week);

    if standings.teams.is_empty() {
        out.push_str("No teams.\n");
    } else {
        out.push_str(&format!(
            "{:<3} {:<24} {:>3} {:>3} {:>3} {:>3} {:>7} {:>7} {:>7} {:>7}\n",
            "#", "Team", "MP", "W", "D", "L", "Pts", "Indiv", "Scratch", "Hcp"
        ));
        for (i, team) in standings.teams.iter().enumerate() {
            out.push_str(&format_team_line(i + 1, team));
            out.push('\n');
        }
    }

    for group in &standings.players {
        let heading = if group.team_id.is_some() {
            group.team_name.as_str()
        } else {
            "Unassigned"
        };
        out.push_str(&format!("\n{heading}\n"));
        out.push_str(&format!(
            "  {:<22} {:>3} {:>6} {:>6} {:>4} {:>4} {:>4}\n",
            "Bowler", "GP", "Avg", "Pts", "Hcp", "HG", "HS"
        ));
        for p in &group.players {
            out.push_str(&format!(
                "  {:<22} {:>3} {:>6.1} {:>6} {:>4} {:>4} {:>4}\n",
                truncate(&p.name, 22),
                p.stat.games_played,
                p.stat.average,
                format_points(p.stat.points),
                p.handicap,
                p.stat.high_game_scratch,
                p.stat.high_series_scratch,
            ));
        }
    }
    out
}

fn format_team_line(rank: usize, team: &TeamStanding) -> String {
    format!(
        "{:<3} {:<24} {:>3} {:>3} {:>3} {:>3} {:>7} {:>7} {:>7} {:>7}",
        rank,
        truncate(&team.team_name, 24),
        team.matches_played,
        team.wins,
        team.draws,
        team.losses,
        format_points(team.points),
        format_points(team.indiv_points),
        team.pins_scratch,
        team.pins_handicap,
    )
}

/// One line per bowler with stats, highest average first.
pub fn format_player_stats(stats: &HashMap<PlayerId, PlayerStat>, players: &[Player]) -> String {
    if stats.is_empty() {
        return "No games recorded.".to_string();
    }

    let mut rows: Vec<(&PlayerId, &PlayerStat)> = stats.iter().collect();
    rows.sort_by(|a, b| {
        b.1.average
            .total_cmp(&a.1.average)
            .then_with(|| display_name(a.0, players).cmp(display_name(b.0, players)))
    });

    let mut out = format!(
        "{:<22} {:>3} {:>6} {:>6} {:>6} {:>6} {:>4} {:>4} {:>4} {:>4}\n",
        "Bowler", "GP", "Avg", "Pts", "Pins", "HPins", "HG", "HGH", "HS", "HSH"
    );
    for (id, s) in rows {
        out.push_str(&format!(
            "{:<22} {:>3} {:>6.1} {:>6} {:>6} {:>6} {:>4} {:>4} {:>4} {:>4}\n",
            truncate(display_name(id, players), 22),
            s.games_played,
            s.average,
            format_points(s.points),
            s.pins_scratch,
            s.pins_handicap,
            s.high_game_scratch,
            s.high_game_handicap,
            s.high_series_scratch,
            s.high_series_handicap,
        ));
    }
    out
}

/// Roster name for a player id, falling back to the id itself.
fn display_name<'a>(id: &'a PlayerId, players: &'a [Player]) -> &'a str {
    players
        .iter()
        .find(|p| &p.id == id)
        .map_or(id.as_str(), |p| p.name.as_str())
}

/// Summary printed after a sheet save.
pub fn format_save_outcome(outcome: &SaveOutcome) -> String {
    let result = &outcome.result;
    let verb = if outcome.replaced { "Updated" } else { "Saved" };
    let mut out = format!(
        "{verb} week {}: {} {} - {} {}\n",
        result.week(),
        result.home.team_id,
        format_points(result.home.team_points),
        format_points(result.away.team_points),
        result.away.team_id,
    );
    if let Some(saved_at) = &outcome.previous_saved_at {
        out.push_str(&format!("  replaces the sheet saved at {saved_at}\n"));
    }
    out.push_str(&format!(
        "  series {} - {} (scratch {} - {})\n",
        result.home.series_pins,
        result.away.series_pins,
        result.home.scratch_series,
        result.away.scratch_series,
    ));
    for update in &outcome.updates {
        let hcp = update
            .hcp
            .map_or_else(|| "-".to_string(), |h| h.to_string());
        out.push_str(&format!(
            "  {}: avg {:.1}, hcp {}\n",
            update.player_id, update.average, hcp
        ));
    }
    out
}

/// Truncate to `max_width` characters, marking the cut with "…".
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else {
        let mut cut: String = chars[..max_width.saturating_sub(1)].iter().collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinsetter_core::{score_match, BowlerRow, LeagueConfig, PlayerUpdate, Sheet};

    #[test]
    fn points_drop_trailing_zero() {
        assert_eq!(format_points(2.0), "2");
        assert_eq!(format_points(1.5), "1.5");
        assert_eq!(format_points(0.0), "0");
    }

    #[test]
    fn truncate_respects_unicode() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Zoë Åkesson-Lindqvist", 6), "Zoë Å…");
        assert_eq!(truncate("Zoë Åkesson-Lindqvist", 6).chars().count(), 6);
    }

    #[test]
    fn empty_stats_message() {
        assert_eq!(format_player_stats(&HashMap::new(), &[]), "No games recorded.");
    }

    #[test]
    fn stats_are_ordered_by_average_and_use_roster_names() {
        let mut stats = HashMap::new();
        stats.insert(
            "p1".to_string(),
            PlayerStat {
                games_played: 3,
                average: 150.0,
                ..PlayerStat::default()
            },
        );
        stats.insert(
            "p2".to_string(),
            PlayerStat {
                games_played: 3,
                average: 180.0,
                ..PlayerStat::default()
            },
        );
        let players = vec![Player::new("p1", "Pat"), Player::new("p2", "Lee")];
        let text = format_player_stats(&stats, &players);
        let lee = text.find("Lee").unwrap();
        let pat = text.find("Pat").unwrap();
        assert!(lee < pat);
        assert!(text.contains("180.0"));
    }

    #[test]
    fn save_outcome_summary() {
        let config = LeagueConfig::default();
        let sheet = Sheet {
            week: 2,
            home_team_id: "t1".into(),
            away_team_id: "t2".into(),
            home: vec![BowlerRow::new("p1", [200, 200, 200], 0)],
            away: vec![BowlerRow::new("p2", [100, 100, 100], 0)],
        };
        let outcome = SaveOutcome {
            result: score_match(&config, &sheet),
            updates: vec![PlayerUpdate {
                player_id: "p1".into(),
                average: 200.0,
                hcp: None,
            }],
            replaced: true,
            previous_saved_at: Some("2026-10-13T19:30:00+00:00".into()),
        };
        let text = format_save_outcome(&outcome);
        assert!(text.starts_with("Updated week 2: t1"));
        assert!(text.contains("replaces the sheet saved at 2026-10-13T19:30:00+00:00"));
        assert!(text.contains("series 600 - 300"));
        assert!(text.contains("p1: avg 200.0, hcp -"));
    }
}
