//! Database module: row models and SQL repository functions.
//!
//! - `model`: view models returned by the repository queries.
//! - `repo`: SQL-only functions over the `coins` and `repositories` tables.
//!
//! The pipeline reads both tables and only ever updates `repositories`.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::TrackedRepository;
