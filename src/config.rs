//! Application configuration persisted as JSON in the platform data
//! directory. Loading is lenient: a missing or unreadable file yields the
//! defaults, so first runs need no setup step.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppSettings {
    /// Base directory for the file-backed dataset store.
    pub data_dir: PathBuf,
    /// Directory report artifacts are written into by the CLI.
    pub report_dir: PathBuf,
    /// Postgres connection URL; when set the database store is used
    /// instead of the file store. Overridden by `--db-url`/`DATABASE_URL`.
    pub database_url: Option<String>,
    /// Dashboard image dimensions in pixels.
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("equipscope");
        Self {
            data_dir: base.join("datasets"),
            report_dir: base.join("reports"),
            database_url: None,
            chart_width: 900,
            chart_height: 700,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub settings: AppSettings,
}

pub fn get_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("equipscope")
        .join("config.json")
}

pub fn load_app_config() -> AppConfig {
    let path = get_config_path();
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
        && let Ok(config) = serde_json::from_str::<AppConfig>(&content)
    {
        return config;
    }

    AppConfig::default()
}

pub fn save_app_config(config: &AppConfig) -> Result<()> {
    let path = get_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_roundtrip() -> Result<()> {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config)?;
        let back: AppConfig = serde_json::from_str(&json)?;
        assert_eq!(back.settings.chart_width, config.settings.chart_width);
        assert_eq!(back.settings.data_dir, config.settings.data_dir);
        Ok(())
    }
}
