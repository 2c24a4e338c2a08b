//! Per-repository fetch, scrape, merge and persist cycle.
use anyhow::Result;
use chrono::{DateTime, Months, Utc};
use futures::TryStreamExt;
use tracing::{debug, info, instrument, warn};

use crate::activity::{commits_last_month, commits_last_week};
use crate::db::{self, Pool, TrackedRepository};
use crate::github::{RepositoryMetadataSource, RepositoryQuery};
use crate::landing_page::PageCounterSource;
use crate::model::{PageCounters, RepositoryMetadata, RepositoryStats};

/// How a single repository's reconciliation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Persisted,
    Abandoned,
}

/// Start of the commit history window for a run started at `now`.
pub fn history_since(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1)).unwrap_or(now)
}

/// Merge fetched metadata and scraped counters into the stored statistics block.
pub fn merge_stats(
    metadata: &RepositoryMetadata,
    counters: &PageCounters,
    now: DateTime<Utc>,
) -> RepositoryStats {
    RepositoryStats {
        language: metadata.language.clone(),
        pull_requests: metadata.pull_requests,
        watchers: metadata.watchers,
        stargazers: metadata.stargazers,
        issues: metadata.issues,
        commits_last_week: commits_last_week(&metadata.history, now),
        commits_last_month: commits_last_month(&metadata.history),
        commits: counters.commits,
        contributors: counters.contributors,
    }
}

/// Refresh the statistics of every tracked repository, one at a time.
///
/// Per-repository failures, including rows that cannot be decoded, are logged
/// and skipped. Only a failure of the repository cursor itself ends the run early.
pub async fn run(
    pool: &Pool,
    metadata: &dyn RepositoryMetadataSource,
    pages: &dyn PageCounterSource,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut rows = db::tracked_repositories(pool);
    while let Some(row) = rows.try_next().await? {
        let repo = match row {
            Ok(repo) => repo,
            Err(err) => {
                warn!(?err, "unreadable repository row; skipping");
                continue;
            }
        };
        let outcome = reconcile_repository(pool, metadata, pages, &repo, now).await;
        debug!(repository_id = repo.id, ?outcome, "repository reconciled");
    }
    info!("reconciliation complete");
    Ok(())
}

#[instrument(skip_all, fields(repository_id = repo.id, coin_id = repo.coin_id))]
async fn reconcile_repository(
    pool: &Pool,
    metadata: &dyn RepositoryMetadataSource,
    pages: &dyn PageCounterSource,
    repo: &TrackedRepository,
    now: DateTime<Utc>,
) -> Outcome {
    let Some(project) = repo.project.as_ref() else {
        warn!(name = %repo.name, "owning project not found; skipping repository");
        return Outcome::Abandoned;
    };

    let query = RepositoryQuery::new(&project.owner, &repo.name, history_since(now));
    let fetched = match metadata.fetch_metadata(&query).await {
        Ok(fetched) => fetched,
        Err(err) => {
            warn!(?err, owner = %project.owner, name = %repo.name, "API error; skipping repository");
            return Outcome::Abandoned;
        }
    };
    if fetched.history.is_truncated() {
        warn!(
            total = fetched.history.total_count,
            fetched = fetched.history.len(),
            "commit history truncated; monthly count is capped"
        );
    }

    let counters = match pages.fetch_counters(&project.owner, &repo.name).await {
        Ok(counters) => counters,
        Err(err) => {
            warn!(%err, owner = %project.owner, name = %repo.name, "scraping error; skipping repository");
            return Outcome::Abandoned;
        }
    };

    let stats = merge_stats(&fetched, &counters, now);
    match db::update_repository_stats(pool, repo.id, &stats).await {
        Ok(()) => Outcome::Persisted,
        Err(err) => {
            warn!(?err, "failed to store repository statistics");
            Outcome::Abandoned
        }
    }
}
