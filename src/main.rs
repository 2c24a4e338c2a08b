use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use repo_stats_batch::config::{self, DEFAULT_CONFIG_DIR};
use repo_stats_batch::db;
use repo_stats_batch::github::GithubClient;
use repo_stats_batch::landing_page::PageScraper;
use repo_stats_batch::logging::{self, DEFAULT_LOG_FILE};
use repo_stats_batch::reconcile;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Refresh GitHub statistics for every tracked coin repository and exit"
)]
struct Args {
    /// Directory holding `<ENVIRONMENT>.yaml` configuration files
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// File the log stream is appended to, in addition to stdout
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::from_env(&args.config_dir)?;
    logging::init(&args.log_file)
        .with_context(|| format!("failed to open log file {}", args.log_file.display()))?;

    let database_url = settings.config.database.database_url()?;
    let pool = db::init_pool(&database_url).await?;

    let github = &settings.config.github;
    let http = reqwest::Client::builder()
        .user_agent(github.user_agent.as_str())
        .build()
        .context("failed to build HTTP client")?;
    let metadata = GithubClient::new(http.clone(), &github.api_url, settings.github_token.clone())?;
    let pages = PageScraper::new(http, github.page_base_url.as_str());

    let now = Utc::now();
    info!(since = %reconcile::history_since(now), "starting repository statistics batch");
    let result = reconcile::run(&pool, &metadata, &pages, now).await;
    if let Err(err) = &result {
        error!(?err, "reconciliation aborted");
    }
    pool.close().await;
    result
}
