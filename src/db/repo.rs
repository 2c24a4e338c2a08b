use super::model::TrackedRepository;
use crate::model::{Project, RepositoryStats};
use anyhow::{anyhow, Context, Result};
use futures::stream::{BoxStream, StreamExt};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::instrument;

pub type Pool = AnyPool;

// The Any driver cannot decode NULL into `Option<_>`, so every selected
// column is non-null and a missing project is flagged by `has_project`.
const TRACKED_REPOSITORIES_SQL: &str = "SELECT r.id, r.coin_id, r.name, \
     CASE WHEN c.id IS NULL THEN 0 ELSE 1 END AS has_project, \
     COALESCE(c.id, 0) AS project_id, COALESCE(c.name, '') AS project_name, \
     COALESCE(c.symbol, '') AS project_symbol, COALESCE(c.owner, '') AS project_owner \
     FROM repositories r LEFT JOIN coins c ON c.id = r.coin_id \
     ORDER BY r.id";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .connect(database_url)
        .await
        .context("failed to connect to database")?;
    if database_url.starts_with("sqlite:") {
        // The read cursor and the per-row updates use separate connections.
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&pool)
            .await?;
    }
    Ok(pool)
}

/// Stream every repository joined with its owning project, one row at a time.
///
/// The stream holds a single open cursor for its whole lifetime. An outer
/// error means the cursor itself failed; an inner error means only that row
/// could not be decoded.
pub fn tracked_repositories(pool: &Pool) -> BoxStream<'_, Result<Result<TrackedRepository>>> {
    sqlx::query(TRACKED_REPOSITORIES_SQL)
        .fetch(pool)
        .map(|row| -> Result<Result<TrackedRepository>> {
            let row = row.context("failed to read repositories cursor")?;
            Ok(tracked_from_row(&row))
        })
        .boxed()
}

fn tracked_from_row(row: &AnyRow) -> Result<TrackedRepository> {
    let id: i64 = row.try_get("id")?;
    let decoded = (|| -> Result<TrackedRepository, sqlx::Error> {
        let has_project: i64 = row.try_get("has_project")?;
        let project = if has_project != 0 {
            Some(Project {
                id: row.try_get("project_id")?,
                name: row.try_get("project_name")?,
                symbol: row.try_get("project_symbol")?,
                owner: row.try_get("project_owner")?,
            })
        } else {
            None
        };
        Ok(TrackedRepository {
            id,
            coin_id: row.try_get("coin_id")?,
            name: row.try_get("name")?,
            project,
        })
    })();
    decoded.with_context(|| format!("failed to decode repository {}", id))
}

/// Overwrite the whole statistics block of one repository in a single statement.
#[instrument(skip(pool, stats))]
pub async fn update_repository_stats(
    pool: &Pool,
    repository_id: i64,
    stats: &RepositoryStats,
) -> Result<()> {
    let res = sqlx::query(
        "UPDATE repositories SET language = ?, pull_requests_count = ?, watchers_count = ?, \
         stargazers_count = ?, issues_count = ?, commits_count_for_the_last_week = ?, \
         commits_count_for_the_last_month = ?, commits_count = ?, contributors_count = ?, \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(stats.language.as_str())
    .bind(stats.pull_requests)
    .bind(stats.watchers)
    .bind(stats.stargazers)
    .bind(stats.issues)
    .bind(stats.commits_last_week)
    .bind(stats.commits_last_month)
    .bind(stats.commits)
    .bind(stats.contributors)
    .bind(repository_id)
    .execute(pool)
    .await?;
    if res.rows_affected() == 0 {
        return Err(anyhow!("repository {} not found", repository_id));
    }
    Ok(())
}

/// Read back the stored statistics block of one repository.
#[instrument(skip_all)]
pub async fn repository_stats(pool: &Pool, repository_id: i64) -> Result<Option<RepositoryStats>> {
    let row = sqlx::query(
        "SELECT COALESCE(language, '') AS language, pull_requests_count, watchers_count, stargazers_count, issues_count, \
         commits_count_for_the_last_week, commits_count_for_the_last_month, commits_count, \
         contributors_count FROM repositories WHERE id = ?",
    )
    .bind(repository_id)
    .fetch_optional(pool)
    .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(Some(RepositoryStats {
        language: row.try_get("language")?,
        pull_requests: row.try_get("pull_requests_count")?,
        watchers: row.try_get("watchers_count")?,
        stargazers: row.try_get("stargazers_count")?,
        issues: row.try_get("issues_count")?,
        commits_last_week: row.try_get("commits_count_for_the_last_week")?,
        commits_last_month: row.try_get("commits_count_for_the_last_month")?,
        commits: row.try_get("commits_count")?,
        contributors: row.try_get("contributors_count")?,
    }))
}
