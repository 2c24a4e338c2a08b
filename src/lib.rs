pub mod activity;
pub mod config;
pub mod db;
pub mod github;
pub mod landing_page;
pub mod logging;
pub mod model;
pub mod reconcile;
