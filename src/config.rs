//! Configuration loader and validator for the repository statistics batch.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_DIR: &str = "./config/env";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_PAGE_BASE_URL: &str = "https://github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub database: DbConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

/// Database connection parameters. `password` never comes from the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DbConfig {
    pub driver: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub user: String,
    #[serde(skip)]
    pub password: String,
    pub database: String,
    #[serde(default)]
    pub charset: String,
    #[serde(default)]
    pub parse_time: String,
}

/// Remote endpoints used by the fetcher and the scraper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_base_url")]
    pub page_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_base_url: default_page_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_page_base_url() -> String {
    DEFAULT_PAGE_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("repo-stats-batch/{}", env!("CARGO_PKG_VERSION"))
}

/// Everything the batch needs from the process environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub github_token: String,
}

impl DbConfig {
    /// Render the sqlx connection URL for this database.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        match self.driver.as_str() {
            "sqlite" => Ok(format!("sqlite://{}", self.database)),
            "mysql" => {
                let mut url = Url::parse(&format!("mysql://{}:{}", self.host, self.port))
                    .map_err(|_| ConfigError::Invalid("database.host/port do not form a valid URL"))?;
                url.set_path(&format!("/{}", self.database));
                url.set_username(&self.user)
                    .map_err(|_| ConfigError::Invalid("database.user cannot be used in a URL"))?;
                if !self.password.is_empty() {
                    url.set_password(Some(&self.password))
                        .map_err(|_| ConfigError::Invalid("database password cannot be used in a URL"))?;
                }
                if !self.charset.is_empty() {
                    url.query_pairs_mut().append_pair("charset", &self.charset);
                }
                Ok(url.to_string())
            }
            _ => Err(ConfigError::Invalid("database.driver must be mysql or sqlite")),
        }
    }
}

/// Path of the configuration file selected by `environment`.
pub fn config_path(dir: &Path, environment: &str) -> PathBuf {
    dir.join(format!("{environment}.yaml"))
}

/// Load configuration from a YAML file and validate it.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Read `ENVIRONMENT`, `DB_PASSWORD` and `GITHUB_TOKEN` and load the selected file.
pub fn from_env(dir: &Path) -> Result<Settings, ConfigError> {
    resolve(
        dir,
        std::env::var("ENVIRONMENT").ok(),
        std::env::var("DB_PASSWORD").ok(),
        std::env::var("GITHUB_TOKEN").ok(),
    )
}

/// Startup validation with environment values passed in explicitly.
pub fn resolve(
    dir: &Path,
    environment: Option<String>,
    db_password: Option<String>,
    github_token: Option<String>,
) -> Result<Settings, ConfigError> {
    let environment = environment
        .filter(|e| !e.trim().is_empty())
        .ok_or(ConfigError::MissingEnv("ENVIRONMENT"))?;
    let github_token = github_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingEnv("GITHUB_TOKEN"))?;

    let mut config = load(&config_path(dir, &environment))?;
    config.database.password = db_password.unwrap_or_default();

    Ok(Settings {
        config,
        github_token,
    })
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let db = &cfg.database;
    match db.driver.as_str() {
        "mysql" => {
            if db.host.trim().is_empty() {
                return Err(ConfigError::Invalid("database.host must be non-empty"));
            }
            if db.port.trim().parse::<u16>().is_err() {
                return Err(ConfigError::Invalid("database.port must be a port number"));
            }
            if db.user.trim().is_empty() {
                return Err(ConfigError::Invalid("database.user must be non-empty"));
            }
        }
        "sqlite" => {}
        _ => return Err(ConfigError::Invalid("database.driver must be mysql or sqlite")),
    }
    if db.database.trim().is_empty() {
        return Err(ConfigError::Invalid("database.database must be non-empty"));
    }

    if Url::parse(&cfg.github.api_url).is_err() {
        return Err(ConfigError::Invalid("github.api_url must be a valid URL"));
    }
    if Url::parse(&cfg.github.page_base_url).is_err() {
        return Err(ConfigError::Invalid("github.page_base_url must be a valid URL"));
    }

    Ok(())
}

/// Sample configuration document.
pub fn example() -> &'static str {
    r#"database:
  driver: "mysql"
  host: "127.0.0.1"
  port: "3306"
  user: "batch"
  database: "coins"
  charset: "utf8mb4"
  parse_time: "True"

github:
  api_url: "https://api.github.com/graphql"
  page_base_url: "https://github.com"
"#
}
