use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::state::{ContentType, Platform, Tone};

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub studio: StudioConfig,

    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_folder")]
    pub folder: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StudioConfig {
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
    #[serde(default)]
    pub default_platform: Platform,
    #[serde(default)]
    pub default_tone: Tone,
    #[serde(default)]
    pub default_content_type: ContentType,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublishConfig {
    #[serde(default = "default_publish_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

fn default_storage_folder() -> String {
    ".postia".to_string()
}
fn default_autosave_delay_ms() -> u64 {
    3000
}
fn default_publish_delay_ms() -> u64 {
    2000
}
fn default_reset_delay_ms() -> u64 {
    2000
}
fn default_history_cap() -> usize {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            folder: default_storage_folder(),
        }
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: default_autosave_delay_ms(),
            default_platform: Platform::default(),
            default_tone: Tone::default(),
            default_content_type: ContentType::default(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_publish_delay_ms(),
            reset_delay_ms: default_reset_delay_ms(),
            history_cap: default_history_cap(),
        }
    }
}

impl StudioConfig {
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl PublishConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Missing file means defaults; a malformed file is still an error.
    pub fn load_or_default() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            log::info!("{} not found, using default settings", CONFIG_FILE);
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Path::new(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() -> Result<()> {
        let yaml = r#"
studio:
  default_platform: twitter
publish:
  history_cap: 10
"#;
        let config: Config = serde_yaml_ng::from_str(yaml)?;

        assert_eq!(config.studio.default_platform, Platform::Twitter);
        assert_eq!(config.studio.autosave_delay_ms, 3000);
        assert_eq!(config.publish.history_cap, 10);
        assert_eq!(config.publish.delay(), Duration::from_secs(2));
        assert_eq!(config.storage.folder, ".postia");
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let path = temp_dir.path().join("config.yml");

        let mut config = Config::default();
        config.studio.default_tone = Tone::Humorous;
        config.publish.reset_delay_ms = 10;
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.studio.default_tone, Tone::Humorous);
        assert_eq!(loaded.publish.reset_delay_ms, 10);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&temp_dir.path().join("nope.yml")).is_err());
    }
}
