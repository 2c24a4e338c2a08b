use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

use crate::github::model::{GraphqlResponse, RepositoryNode};
use crate::model::{CommitHistory, RepositoryMetadata};

pub mod model;

/// Upper bound on commit nodes requested per repository; there is no pagination.
pub const HISTORY_PAGE_SIZE: u32 = 100;

const REPOSITORY_QUERY: &str = r#"query($owner: String!, $name: String!, $since: GitTimestamp!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequests { totalCount }
    stargazers { totalCount }
    watchers { totalCount }
    issues { totalCount }
    primaryLanguage { name }
    defaultBranchRef {
      name
      target {
        ... on Commit {
          history(first: $first, since: $since) {
            totalCount
            nodes { committedDate }
          }
        }
      }
    }
  }
}"#;

/// Source of repository metadata, one call per repository.
#[async_trait]
pub trait RepositoryMetadataSource: Send + Sync {
    async fn fetch_metadata(&self, query: &RepositoryQuery) -> Result<RepositoryMetadata>;
}

/// Variables for a single repository query, built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryQuery {
    pub owner: String,
    pub name: String,
    pub since: DateTime<Utc>,
}

impl RepositoryQuery {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, since: DateTime<Utc>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            since,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({
            "query": REPOSITORY_QUERY,
            "variables": {
                "owner": self.owner,
                "name": self.name,
                "since": self.since.to_rfc3339_opts(SecondsFormat::Secs, true),
                "first": HISTORY_PAGE_SIZE,
            }
        })
    }
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_url: Url,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    pub fn new(http: Client, api_url: &str, token: String) -> Result<Self> {
        let api_url = Url::parse(api_url).context("invalid GitHub GraphQL URL")?;
        Ok(Self {
            http,
            api_url,
            token,
        })
    }

    pub fn build_request(&self, query: &RepositoryQuery) -> Result<reqwest::Request> {
        self.http
            .post(self.api_url.clone())
            .bearer_auth(&self.token)
            .header("Content-Type", "application/json")
            .json(&query.to_body())
            .build()
            .context("failed to build GraphQL request")
    }

    pub async fn query_repository(&self, query: &RepositoryQuery) -> Result<RepositoryMetadata> {
        let request = self.build_request(query)?;
        debug!(owner = %query.owner, name = %query.name, "querying repository metadata");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach GitHub GraphQL API")?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("github graphql error {}: {}", status, body));
        }

        let body = res
            .text()
            .await
            .context("failed to read GraphQL response")?;
        parse_response(&body)
    }
}

#[async_trait]
impl RepositoryMetadataSource for GithubClient {
    async fn fetch_metadata(&self, query: &RepositoryQuery) -> Result<RepositoryMetadata> {
        self.query_repository(query).await
    }
}

/// Decode a GraphQL response body into repository metadata.
pub fn parse_response(body: &str) -> Result<RepositoryMetadata> {
    let payload: GraphqlResponse =
        serde_json::from_str(body).context("invalid GraphQL response JSON")?;
    if !payload.errors.is_empty() {
        let messages: Vec<&str> = payload.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(anyhow!("graphql query failed: {}", messages.join("; ")));
    }
    let repository = payload
        .data
        .and_then(|d| d.repository)
        .ok_or_else(|| anyhow!("graphql response has no repository"))?;
    Ok(into_metadata(repository))
}

fn into_metadata(node: RepositoryNode) -> RepositoryMetadata {
    let history = node
        .default_branch_ref
        .and_then(|branch| branch.target)
        .and_then(|target| target.history)
        .map(|history| CommitHistory {
            total_count: history.total_count,
            committed_at: history.nodes.into_iter().map(|n| n.committed_date).collect(),
        })
        .unwrap_or_default();

    RepositoryMetadata {
        pull_requests: node.pull_requests.total_count,
        watchers: node.watchers.total_count,
        stargazers: node.stargazers.total_count,
        issues: node.issues.total_count,
        language: node.primary_language.map(|l| l.name).unwrap_or_default(),
        history,
    }
}
