use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Report configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Rows shown in "top" rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Rates at or above this are on track.
    #[serde(default = "default_on_track_rate")]
    pub on_track_rate: f64,

    /// Rates at or above this (but below on-track) need watching.
    #[serde(default = "default_watch_rate")]
    pub watch_rate: f64,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_db_path() -> PathBuf {
    PathBuf::from("data/findash.duckdb")
}
fn default_true() -> bool {
    true
}
fn default_top_n() -> usize {
    3
}
fn default_on_track_rate() -> f64 {
    80.0
}
fn default_watch_rate() -> f64 {
    60.0
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            run_migrations: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            on_track_rate: default_on_track_rate(),
            watch_rate: default_watch_rate(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("FINDASH").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.db_path, PathBuf::from("data/findash.duckdb"));
        assert!(cfg.storage.run_migrations);
        assert_eq!(cfg.report.top_n, 3);
        assert_eq!(cfg.report.on_track_rate, 80.0);
        assert_eq!(cfg.report.watch_rate, 60.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[report]\ntop_n = 5\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.report.top_n, 5);
        assert_eq!(cfg.report.watch_rate, 60.0);
        assert_eq!(cfg.storage.db_path, PathBuf::from("data/findash.duckdb"));
    }
}
