use std::fs::OpenOptions;

use color_eyre::eyre::Context;
use db::{setup_db_pool, SqlitePool};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Every pantry request acts on behalf of this user until there is authentication
pub(crate) const USER_ID: i64 = 1;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub seed_data: bool,
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> crate::Result<Self> {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port
            .parse::<u16>()
            .wrap_err_with(|| format!("Invalid PORT {port}"))?;

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => match std::env::var("DATABASE_PATH") {
                Ok(path) => {
                    OpenOptions::new()
                        .write(true)
                        .create(true)
                        .truncate(false)
                        .open(&path)
                        .wrap_err_with(|| format!("Couldn't create database file at {path}"))?;

                    format!("sqlite:{path}")
                }
                Err(_) => "sqlite::memory:".to_string(),
            },
        };

        let seed_data = match std::env::var("SEED_DATA") {
            Ok(value) => parse_flag(&value)
                .ok_or_else(|| color_eyre::eyre::eyre!("Invalid SEED_DATA {value}"))?,
            Err(_) => true,
        };

        Ok(Self {
            port,
            database_url,
            seed_data,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: &'static str,
    pub git_commit: Option<&'static str>,
}

impl VersionInfo {
    #[instrument(name = "VersionInfo::from_env")]
    fn from_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: option_env!("GIT_COMMIT"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub versions: VersionInfo,
    pub db: SqlitePool,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> crate::Result<Self> {
        let app = AppConfig::from_env()?;
        let db = setup_db_pool(&app.database_url).await?;

        Ok(Self::new(app, db))
    }

    pub fn new(app: AppConfig, db: SqlitePool) -> Self {
        Self {
            app,
            versions: VersionInfo::from_env(),
            db,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }
}
