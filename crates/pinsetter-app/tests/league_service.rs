// Integration tests for the league service.
//
// These run the full save -> score -> recompute -> persist path against an
// in-memory database through the library crate's public API.

use std::sync::Arc;

use pinsetter_app::config::LeagueSettings;
use pinsetter_app::roster::load_roster_from_reader;
use pinsetter_app::service::{LeagueService, ServiceError};
use pinsetter_app::store::Database;
use pinsetter_core::{normalize_league, BowlerRow, RawLeagueConfig, Sheet};

// ===========================================================================
// Test helpers
// ===========================================================================

const LEAGUE: &str = "tuesday-mixed";

const ROSTER: &str = "\
team_id,team_name,player_id,player_name,average,hcp
t1,Alley Cats,h1,Hana,,
t1,Alley Cats,h2,Hugo,,
t2,Gutter Gang,a1,Ari,,
t2,Gutter Gang,a2,Alex,,
t3,Split Happens,s1,Sol,,
t3,Split Happens,s2,Sky,,
";

fn settings(lock_from: f64, lock_weeks: f64) -> LeagueSettings {
    let raw = RawLeagueConfig {
        mode: Some("handicap".into()),
        handicap_base: Some(200.0),
        handicap_percent: Some(90.0),
        hcp_lock_from_week: Some(lock_from),
        hcp_lock_weeks: Some(lock_weeks),
        team_points_win: Some(2.0),
        team_points_draw: Some(1.0),
        indiv_points_win: Some(1.0),
        indiv_points_draw: Some(0.5),
        ..RawLeagueConfig::default()
    };
    LeagueSettings {
        id: LEAGUE.into(),
        name: "Tuesday Night Mixed".into(),
        scoring: normalize_league(&raw),
        raw,
    }
}

/// Service over a fresh in-memory database with the roster imported.
fn service_with(settings: &LeagueSettings) -> LeagueService {
    let service = LeagueService::new(Database::open(":memory:").unwrap());
    service.ensure_league(settings).unwrap();
    let entries = load_roster_from_reader(ROSTER.as_bytes()).unwrap();
    service.import_roster(LEAGUE, &entries).unwrap();
    service
}

/// Fill a template sheet's games in row order.
fn fill(mut sheet: Sheet, home: [[i64; 3]; 2], away: [[i64; 3]; 2]) -> Sheet {
    let set = |row: &mut BowlerRow, g: [i64; 3]| {
        row.g1 = Some(g[0]);
        row.g2 = Some(g[1]);
        row.g3 = Some(g[2]);
    };
    for (row, g) in sheet.home.iter_mut().zip(home) {
        set(row, g);
    }
    for (row, g) in sheet.away.iter_mut().zip(away) {
        set(row, g);
    }
    sheet
}

fn player_hcp(service: &LeagueService, id: &str) -> Option<i64> {
    service
        .db()
        .load_players(LEAGUE)
        .unwrap()
        .into_iter()
        .find(|p| p.id == id)
        .and_then(|p| p.hcp)
}

const STEADY: [[i64; 3]; 2] = [[150, 150, 150], [180, 180, 180]];
const AWAY: [[i64; 3]; 2] = [[170, 170, 170], [120, 120, 120]];

// ===========================================================================
// Templates and validation
// ===========================================================================

#[test]
fn new_sheet_lists_members_in_roster_order() {
    let service = service_with(&settings(1.0, 0.0));
    let sheet = service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap();
    let home: Vec<&str> = sheet.home.iter().map(|r| r.player_id.as_str()).collect();
    let away: Vec<&str> = sheet.away.iter().map(|r| r.player_id.as_str()).collect();
    assert_eq!(home, vec!["h1", "h2"]);
    assert_eq!(away, vec!["a1", "a2"]);
    // No average yet: (200 - 0) * 0.9 = 180.
    assert!(sheet.home.iter().all(|r| r.hcp == 180 && r.g1.is_none()));
}

#[test]
fn invalid_fixtures_are_rejected() {
    let service = service_with(&settings(1.0, 0.0));
    assert!(matches!(
        service.new_sheet(LEAGUE, 1, "t1", "t1"),
        Err(ServiceError::InvalidSheet(_))
    ));
    assert!(matches!(
        service.new_sheet(LEAGUE, 0, "t1", "t2"),
        Err(ServiceError::InvalidSheet(_))
    ));
    assert!(matches!(
        service.new_sheet(LEAGUE, 1, "t1", "t9"),
        Err(ServiceError::UnknownTeam { .. })
    ));
    assert!(matches!(
        service.standings("nope", None),
        Err(ServiceError::LeagueNotFound(_))
    ));
}

// ===========================================================================
// Save, overwrite, recompute
// ===========================================================================

#[test]
fn save_scores_match_and_updates_cache() {
    let service = service_with(&settings(1.0, 0.0));
    let sheet = fill(service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap(), STEADY, AWAY);
    let outcome = service.save_sheet(LEAGUE, sheet).unwrap();

    assert!(!outcome.replaced);
    assert_eq!(outcome.previous_saved_at, None);
    // Every row has hcp 180, so handicap pins track scratch.
    // Home 330 per game vs away 290: three game wins and the series.
    assert_eq!(outcome.result.home.team_points, 8.0);
    assert_eq!(outcome.result.away.team_points, 0.0);
    assert_eq!(outcome.updates.len(), 4);

    let players = service.db().load_players(LEAGUE).unwrap();
    let h1 = players.iter().find(|p| p.id == "h1").unwrap();
    assert_eq!(h1.average, 150.0);
    assert_eq!(h1.hcp, Some(45));
    // Players who did not bowl keep their empty cache.
    assert_eq!(player_hcp(&service, "s1"), None);
}

#[test]
fn resave_overwrites_sheet_and_result() {
    let service = service_with(&settings(1.0, 0.0));
    let template = service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap();
    service
        .save_sheet(LEAGUE, fill(template.clone(), STEADY, AWAY))
        .unwrap();
    let second = service
        .save_sheet(
            LEAGUE,
            fill(template, [[100, 100, 100], [100, 100, 100]], AWAY),
        )
        .unwrap();

    assert!(second.replaced);
    assert!(second.previous_saved_at.is_some());
    let snapshot = service.snapshot(LEAGUE).unwrap();
    assert_eq!(snapshot.sheets.len(), 1);
    assert_eq!(snapshot.matches.len(), 1);
    assert_eq!(snapshot.matches[0], second.result);
    assert_eq!(snapshot.players.iter().find(|p| p.id == "h1").unwrap().average, 100.0);
}

#[test]
fn correction_that_drops_a_bowler_resets_their_cache() {
    let service = service_with(&settings(1.0, 0.0));
    let template = service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap();
    let original = fill(template, [[200, 200, 200], [180, 180, 180]], AWAY);
    service.save_sheet(LEAGUE, original.clone()).unwrap();
    assert_eq!(player_hcp(&service, "h1"), Some(0));

    // h1 was entered by mistake: the corrected sheet lists only h2.
    let mut corrected = original;
    corrected.home.remove(0);
    let outcome = service.save_sheet(LEAGUE, corrected).unwrap();
    assert!(outcome.updates.iter().any(|u| u.player_id == "h1"));

    let snapshot = service.snapshot(LEAGUE).unwrap();
    let h1 = snapshot.players.iter().find(|p| p.id == "h1").unwrap();
    assert_eq!(h1.average, 0.0);
    // No lock window: recomputed from the empty average.
    assert_eq!(h1.hcp, Some(180));
    assert!(!service.player_stats(LEAGUE, None).unwrap().stats.contains_key("h1"));

    // The next template no longer carries the discarded handicap.
    let next = service.new_sheet(LEAGUE, 2, "t1", "t2").unwrap();
    assert_eq!(next.home[0].player_id, "h1");
    assert_eq!(next.home[0].hcp, 180);
}

#[test]
fn correction_inside_freeze_keeps_stored_handicap_for_dropped_bowler() {
    // Week 1 is locked.
    let service = service_with(&settings(1.0, 1.0));
    let template = service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap();
    let original = fill(template, STEADY, AWAY);
    service.save_sheet(LEAGUE, original.clone()).unwrap();
    assert_eq!(player_hcp(&service, "h1"), Some(45));

    let mut corrected = original;
    corrected.home.remove(0);
    service.save_sheet(LEAGUE, corrected).unwrap();

    let snapshot = service.snapshot(LEAGUE).unwrap();
    let h1 = snapshot.players.iter().find(|p| p.id == "h1").unwrap();
    assert_eq!(h1.average, 0.0);
    assert_eq!(h1.hcp, Some(45));
}

#[test]
fn saving_the_same_sheet_twice_changes_nothing_the_second_time() {
    let service = service_with(&settings(2.0, 2.0));
    let sheet = fill(service.new_sheet(LEAGUE, 2, "t1", "t2").unwrap(), STEADY, AWAY);
    service.save_sheet(LEAGUE, sheet.clone()).unwrap();
    let before = service.db().load_players(LEAGUE).unwrap();

    let again = service.save_sheet(LEAGUE, sheet).unwrap();
    assert!(again.replaced);
    assert!(again.updates.is_empty());
    assert_eq!(service.db().load_players(LEAGUE).unwrap(), before);
}

#[test]
fn freeze_window_holds_then_releases_handicap() {
    // Locked weeks: 2 and 3.
    let service = service_with(&settings(2.0, 2.0));
    let week = |w: u32, home: [[i64; 3]; 2]| {
        let sheet = fill(service.new_sheet(LEAGUE, w, "t1", "t2").unwrap(), home, AWAY);
        service.save_sheet(LEAGUE, sheet).unwrap();
    };

    week(1, STEADY);
    assert_eq!(player_hcp(&service, "h1"), None);

    week(2, STEADY);
    assert_eq!(player_hcp(&service, "h1"), Some(45));

    week(3, [[210, 210, 210], [180, 180, 180]]);
    assert_eq!(player_hcp(&service, "h1"), Some(45));
    // The next template still carries the stored value.
    let template = service.new_sheet(LEAGUE, 4, "t1", "t2").unwrap();
    assert_eq!(template.home[0].hcp, 45);

    // Week 4 is past the window: average (450*2 + 630 + 450) / 12 = 165.0.
    week(4, STEADY);
    assert_eq!(player_hcp(&service, "h1"), Some(32));
}

// ===========================================================================
// Reads
// ===========================================================================

#[test]
fn standings_default_to_latest_week_and_filter_earlier() {
    let service = service_with(&settings(1.0, 0.0));
    let w1 = fill(service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap(), STEADY, AWAY);
    service.save_sheet(LEAGUE, w1).unwrap();
    let w2 = fill(
        service.new_sheet(LEAGUE, 2, "t3", "t1").unwrap(),
        [[300, 300, 300], [300, 300, 300]],
        STEADY,
    );
    service.save_sheet(LEAGUE, w2).unwrap();

    let latest = service.standings(LEAGUE, None).unwrap();
    assert_eq!(latest.as_of_week, 2);
    assert_eq!(latest.teams.iter().map(|t| t.matches_played).sum::<u32>(), 4);
    // t1 and t3 are level on 8 points; name breaks the tie.
    assert_eq!(latest.teams[0].team_id, "t1");
    assert_eq!(latest.teams[1].team_id, "t3");
    assert_eq!(latest.teams[1].points, 8.0);

    let week1 = service.standings(LEAGUE, Some(1)).unwrap();
    assert_eq!(week1.teams[0].team_id, "t1");
    assert_eq!(week1.teams[0].points, 8.0);
    let h1 = week1
        .players
        .iter()
        .flat_map(|g| &g.players)
        .find(|p| p.player_id == "h1")
        .unwrap();
    assert_eq!(h1.stat.games_played, 3);

    let all = service.player_stats(LEAGUE, None).unwrap();
    let upto2 = service.player_stats(LEAGUE, Some(2)).unwrap();
    assert_eq!(all.stats, upto2.stats);
    assert_eq!(all.stats["h1"].games_played, 6);
}

#[test]
fn player_stats_come_with_the_roster_they_were_read_with() {
    let service = service_with(&settings(1.0, 0.0));
    let w1 = fill(service.new_sheet(LEAGUE, 1, "t1", "t2").unwrap(), STEADY, AWAY);
    service.save_sheet(LEAGUE, w1).unwrap();

    let report = service.player_stats(LEAGUE, Some(1)).unwrap();
    assert_eq!(report.cutoff, Some(1));
    assert_eq!(report.players, service.snapshot(LEAGUE).unwrap().players);
    // The roster carries the cache written by the same save the stats see.
    let h1 = report.players.iter().find(|p| p.id == "h1").unwrap();
    assert_eq!(h1.average, report.stats["h1"].average);
}

#[test]
fn concurrent_saves_to_one_league_all_land() {
    let service = Arc::new(service_with(&settings(1.0, 0.0)));
    let fixtures = [(1, "t1", "t2"), (1, "t3", "t1"), (2, "t2", "t3"), (2, "t1", "t2")];

    std::thread::scope(|scope| {
        for (week, home, away) in fixtures {
            let service = Arc::clone(&service);
            scope.spawn(move || {
                let sheet = service.new_sheet(LEAGUE, week, home, away).unwrap();
                let sheet = fill(sheet, STEADY, AWAY);
                service.save_sheet(LEAGUE, sheet).unwrap();
            });
        }
    });

    let snapshot = service.snapshot(LEAGUE).unwrap();
    assert_eq!(snapshot.sheets.len(), 4);
    assert_eq!(snapshot.matches.len(), 4);
}
