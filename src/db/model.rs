//! Row models returned by repositories.

use crate::model::Project;

/// A `repositories` row joined with its owning project.
///
/// `project` is `None` when `coin_id` does not resolve to a `coins` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRepository {
    pub id: i64,
    pub coin_id: i64,
    pub name: String,
    pub project: Option<Project>,
}
