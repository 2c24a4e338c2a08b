use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct GraphqlResponse {
    pub data: Option<QueryData>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Deserialize, Debug)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct QueryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub pull_requests: TotalCount,
    pub stargazers: TotalCount,
    pub watchers: TotalCount,
    pub issues: TotalCount,
    pub primary_language: Option<Language>,
    pub default_branch_ref: Option<BranchRef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: i64,
}

#[derive(Deserialize, Debug)]
pub struct Language {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub struct BranchRef {
    pub name: String,
    pub target: Option<CommitTarget>,
}

/// `... on Commit` fragment; non-commit targets decode with no history.
#[derive(Deserialize, Debug)]
pub struct CommitTarget {
    pub history: Option<History>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub total_count: i64,
    #[serde(default)]
    pub nodes: Vec<CommitNode>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub committed_date: DateTime<Utc>,
}
