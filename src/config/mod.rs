//! Configuration for the lorecrawl engine.
//!
//! TOML file with three sections:
//!
//! - [`GameConfig`] - world dimensions and data directory
//! - [`NarrativeConfig`] - narrative service endpoint and retry policy
//! - [`LoggingConfig`] - log level
//!
//! ```toml
//! [game]
//! rows = 3
//! cols = 4
//! data_dir = "data"
//!
//! [narrative]
//! base_url = "http://127.0.0.1:11434"
//! model = "llama3"
//! request_timeout_secs = 30
//! max_attempts = 3
//! retry_backoff_ms = 1000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! An empty `base_url` switches the engine to the offline scripted
//! narrator, which is handy for demos and tests.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// World and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Grid height in cells.
    pub rows: usize,
    /// Grid width in cells.
    pub cols: usize,
    /// Directory holding the document store.
    pub data_dir: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 3,
            cols: 4,
            data_dir: "data".to_string(),
        }
    }
}

/// Narrative service endpoint plus the retry policy applied to every
/// generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Service base URL. Empty means offline mode.
    #[serde(default)]
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3".to_string(),
            request_timeout_secs: 30,
            max_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            narrative: NarrativeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.game.rows == 0 || self.game.cols == 0 {
            return Err(anyhow!(
                "game grid must be at least 1x1 (got {}x{})",
                self.game.rows,
                self.game.cols
            ));
        }
        if self.game.data_dir.trim().is_empty() {
            return Err(anyhow!("game.data_dir must not be empty"));
        }
        if !self.narrative.base_url.is_empty() && self.narrative.model.trim().is_empty() {
            return Err(anyhow!("narrative.model must be set when base_url is set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.game.rows, 3);
        assert_eq!(config.game.cols, 4);
        assert_eq!(config.narrative.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [game]
            rows = 5
            cols = 5
            data_dir = "state"
            "#,
        )
        .expect("parse");
        assert_eq!(config.game.rows, 5);
        assert_eq!(config.narrative.model, "llama3");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let mut config = Config::default();
        config.game.rows = 0;
        assert!(config.validate().is_err());
    }
}
