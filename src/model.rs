use chrono::{DateTime, Utc};

/// A tracked coin/project owning one or more repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub owner: String,
}

/// Repository metadata returned by the GraphQL fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub pull_requests: i64,
    pub watchers: i64,
    pub stargazers: i64,
    pub issues: i64,
    pub language: String,
    pub history: CommitHistory,
}

/// Commits on the default branch since the query's `since` bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitHistory {
    pub total_count: i64,
    pub committed_at: Vec<DateTime<Utc>>,
}

impl CommitHistory {
    pub fn new(committed_at: Vec<DateTime<Utc>>) -> Self {
        Self {
            total_count: committed_at.len() as i64,
            committed_at,
        }
    }

    pub fn len(&self) -> usize {
        self.committed_at.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed_at.is_empty()
    }

    /// More commits exist in the window than the single page returned.
    pub fn is_truncated(&self) -> bool {
        self.total_count > self.len() as i64
    }
}

/// Counters scraped from the repository landing page, in page order.
///
/// Only `commits` and `contributors` are consumed. The middle three values are
/// extracted so that the positional layout can be checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCounters {
    pub commits: i64,
    pub second: i64,
    pub third: i64,
    pub fourth: i64,
    pub contributors: i64,
}

impl PageCounters {
    pub const LEN: usize = 5;

    /// Map exactly `LEN` ordered values to named fields.
    pub fn from_ordered(values: &[i64]) -> Option<Self> {
        match *values {
            [commits, second, third, fourth, contributors] => Some(Self {
                commits,
                second,
                third,
                fourth,
                contributors,
            }),
            _ => None,
        }
    }
}

/// The statistics block written back for one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub language: String,
    pub pull_requests: i64,
    pub watchers: i64,
    pub stargazers: i64,
    pub issues: i64,
    pub commits_last_week: i64,
    pub commits_last_month: i64,
    pub commits: i64,
    pub contributors: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counters_require_exactly_five_values() {
        assert!(PageCounters::from_ordered(&[]).is_none());
        assert!(PageCounters::from_ordered(&[1, 2, 3, 4]).is_none());
        assert!(PageCounters::from_ordered(&[1, 2, 3, 4, 5, 6]).is_none());

        let counters = PageCounters::from_ordered(&[42, 1, 2, 3, 7]).unwrap();
        assert_eq!(counters.commits, 42);
        assert_eq!(counters.contributors, 7);
    }

    #[test]
    fn history_is_truncated_when_total_exceeds_nodes() {
        let now = Utc::now();
        let mut history = CommitHistory::new(vec![now; 100]);
        assert!(!history.is_truncated());
        history.total_count = 250;
        assert!(history.is_truncated());
        assert!(!CommitHistory::default().is_truncated());
    }
}
