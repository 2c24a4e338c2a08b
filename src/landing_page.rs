//! Landing-page scraping for the counters the GraphQL API does not expose.
use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::model::PageCounters;

/// Marker carried by the emphasized numbers on a repository landing page.
pub const COUNTER_SELECTOR: &str = "span.text-emphasized";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid page URL: {0}")]
    Url(String),
    #[error("page fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("counter {index} is not an integer: {text:?}")]
    NotANumber { index: usize, text: String },
    #[error("expected {expected} counters, found {found}")]
    CounterCount { expected: usize, found: usize },
}

/// Source of landing-page counters for a repository.
#[async_trait]
pub trait PageCounterSource: Send + Sync {
    async fn fetch_counters(&self, owner: &str, name: &str) -> Result<PageCounters, ScrapeError>;
}

#[derive(Debug, Clone)]
pub struct PageScraper {
    http: Client,
    base_url: String,
}

impl PageScraper {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn page_url(&self, owner: &str, name: &str) -> Result<Url, ScrapeError> {
        let raw = format!("{}/{}/{}", self.base_url.trim_end_matches('/'), owner, name);
        Url::parse(&raw).map_err(|e| ScrapeError::Url(format!("{raw}: {e}")))
    }
}

#[async_trait]
impl PageCounterSource for PageScraper {
    async fn fetch_counters(&self, owner: &str, name: &str) -> Result<PageCounters, ScrapeError> {
        let url = self.page_url(owner, name)?;
        debug!(%url, "fetching landing page");
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            return Err(ScrapeError::Status(res.status()));
        }
        let html = res.text().await?;
        parse_counters(&html)
    }
}

/// Extract the five emphasized counters from landing-page HTML, in document order.
pub fn parse_counters(html: &str) -> Result<PageCounters, ScrapeError> {
    let values = extract_numbers(html)?;
    PageCounters::from_ordered(&values).ok_or(ScrapeError::CounterCount {
        expected: PageCounters::LEN,
        found: values.len(),
    })
}

fn extract_numbers(html: &str) -> Result<Vec<i64>, ScrapeError> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(COUNTER_SELECTOR).map_err(|e| ScrapeError::Selector(e.to_string()))?;
    document
        .select(&sel)
        .enumerate()
        .map(|(index, node)| {
            let text = node.text().collect::<String>();
            parse_number(&text).ok_or(ScrapeError::NotANumber { index, text })
        })
        .collect()
}

fn parse_number(text: &str) -> Option<i64> {
    text.trim().replace(',', "").parse().ok()
}
