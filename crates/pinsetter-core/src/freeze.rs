// Handicap lock window predicates.

use crate::league::LeagueConfig;

/// Last week of the lock window, `from + weeks - 1`.
fn lock_end(config: &LeagueConfig) -> f64 {
    config.hcp_lock_from_week + config.hcp_lock_weeks - 1.0
}

/// True when `week` falls inside the handicap lock window.
///
/// A window with zero (or negative) length locks nothing.
pub fn in_freeze(config: &LeagueConfig, week: u32) -> bool {
    let w = f64::from(week);
    config.hcp_lock_weeks > 0.0 && config.hcp_lock_from_week <= w && w <= lock_end(config)
}

/// True when handicaps are recomputed freely at `week`: either no lock is
/// configured or the window has already ended.
///
/// Weeks before the window starts are neither frozen nor past the freeze.
pub fn past_freeze(config: &LeagueConfig, week: u32) -> bool {
    config.hcp_lock_weeks == 0.0 || f64::from(week) > lock_end(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(from: f64, weeks: f64) -> LeagueConfig {
        LeagueConfig {
            hcp_lock_from_week: from,
            hcp_lock_weeks: weeks,
            ..LeagueConfig::default()
        }
    }

    #[test]
    fn window_of_two_locks_weeks_three_and_four() {
        let config = lock(3.0, 2.0);
        let frozen: Vec<u32> = (1..=8).filter(|&w| in_freeze(&config, w)).collect();
        assert_eq!(frozen, vec![3, 4]);

        assert!(!past_freeze(&config, 2));
        assert!(!past_freeze(&config, 4));
        assert!(past_freeze(&config, 5));
    }

    #[test]
    fn zero_length_window_is_always_past() {
        let config = lock(3.0, 0.0);
        for week in 0..10 {
            assert!(!in_freeze(&config, week));
            assert!(past_freeze(&config, week));
        }
    }

    #[test]
    fn weeks_before_window_are_neither() {
        let config = lock(5.0, 3.0);
        for week in 1..5 {
            assert!(!in_freeze(&config, week));
            assert!(!past_freeze(&config, week));
        }
    }

    #[test]
    fn fractional_bounds_compare_numerically() {
        let config = lock(2.5, 2.0);
        assert!(!in_freeze(&config, 2));
        assert!(in_freeze(&config, 3));
        assert!(!in_freeze(&config, 4));
        assert!(past_freeze(&config, 4));
    }

    #[test]
    fn in_freeze_and_past_freeze_never_overlap() {
        let config = lock(1.0, 4.0);
        for week in 0..12 {
            assert!(!(in_freeze(&config, week) && past_freeze(&config, week)));
        }
    }
}
