//! Commit activity derived from a fetched history window.
use chrono::{DateTime, Duration, Utc};

use crate::model::CommitHistory;

/// Commits whose timestamp is at or after `now - 7 days`.
pub fn commits_last_week(history: &CommitHistory, now: DateTime<Utc>) -> i64 {
    let cutoff = now - Duration::days(7);
    history
        .committed_at
        .iter()
        .filter(|committed| **committed >= cutoff)
        .count() as i64
}

/// Size of the window; the fetch's `since` already bounds it to one month.
pub fn commits_last_month(history: &CommitHistory) -> i64 {
    history.len() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    #[test]
    fn empty_window_counts_zero() {
        let history = CommitHistory::default();
        assert_eq!(commits_last_week(&history, now()), 0);
        assert_eq!(commits_last_month(&history), 0);
    }

    #[test]
    fn week_counts_only_recent_commits() {
        let history = CommitHistory::new(vec![days_ago(2), days_ago(20), days_ago(6), days_ago(8)]);
        assert_eq!(commits_last_week(&history, now()), 2);
        assert_eq!(commits_last_month(&history), 4);
    }

    #[test]
    fn cutoff_is_inclusive() {
        let history = CommitHistory::new(vec![days_ago(7), days_ago(7) - Duration::seconds(1)]);
        assert_eq!(commits_last_week(&history, now()), 1);
    }

    #[test]
    fn month_is_the_window_length() {
        // The window is not re-filtered; whatever the fetch returned counts.
        let history = CommitHistory::new(vec![days_ago(45), days_ago(1)]);
        assert_eq!(commits_last_month(&history), 2);
    }

    #[test]
    fn week_never_exceeds_month() {
        let windows = [
            vec![],
            vec![days_ago(0)],
            vec![days_ago(1), days_ago(3), days_ago(29)],
            vec![days_ago(10), days_ago(15)],
            (0..30).map(days_ago).collect::<Vec<_>>(),
        ];
        for window in windows {
            let history = CommitHistory::new(window);
            assert!(commits_last_week(&history, now()) <= commits_last_month(&history));
        }
    }

    #[test]
    fn week_is_monotonic_when_appending_recent_commits() {
        let mut history = CommitHistory::new(vec![days_ago(3), days_ago(12)]);
        let mut previous = commits_last_week(&history, now());
        for days in [0, 1, 7, 5] {
            history.committed_at.push(days_ago(days));
            let current = commits_last_week(&history, now());
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 5);
    }
}
