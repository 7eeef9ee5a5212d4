use crate::core::models::DEFAULT_INTERVAL_MS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poll: PollSettings,
    pub http: HttpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    // TODO: scale interval_ms with the size of the polled result set
    pub interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pollbridge").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 {
            anyhow::bail!("poll.interval_ms must be greater than 0");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeout_secs must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.poll.interval_ms, 2000);
        assert_eq!(settings.http.timeout_secs, 30);
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.poll.interval_ms = 0;
        assert!(settings.validate().is_err());

        settings.poll.interval_ms = 500;
        settings.http.timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [poll]
            interval_ms = 1000

            [http]
            timeout_secs = 10
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.poll.interval_ms, 1000);
        assert_eq!(settings.http.timeout_secs, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml = r#"
            [poll]
            interval_ms = 250
        "#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.poll.interval_ms, 250);
        assert_eq!(settings.http.timeout_secs, 30);
    }
}
