use crate::error::{GitBriefError, Result};
use crate::github::RecencyWindow;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key for brief generation
    pub gemini_api_key: String,

    /// GitHub token override (the account store is the normal source)
    pub github_token: Option<String>,

    /// Default recency window in days (1, 3 or 7)
    #[serde(default = "default_days")]
    pub default_days: u32,

    /// Include inactive repositories in the dashboard by default
    #[serde(default)]
    pub show_all: bool,

    /// Gemini model used for brief generation
    #[serde(default = "default_model")]
    pub model: String,
}

const API_KEY_PLACEHOLDER: &str = "AIzaSyYOUR_API_KEY_HERE";

impl Config {
    /// Load configuration from the default location (~/.config/gitbrief/config.toml)
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GitBriefError::config(format!(
                "Config file not found at: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GitBriefError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("gitbrief").join("config.toml"))
    }

    /// Get the default data directory path (holds the account store)
    pub fn default_data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| GitBriefError::config("Could not determine home directory"))?;
        Ok(home.join(".local").join("share").join("gitbrief"))
    }

    /// Create a default configuration file at the default location
    pub fn create_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        // Create parent directories if they don't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)?;
        fs::write(&config_path, toml_string)?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.gemini_api_key.is_empty() {
            return Err(GitBriefError::MissingConfig(
                "gemini_api_key is required".to_string(),
            ));
        }

        if !self.gemini_api_key.starts_with("AIza") {
            return Err(GitBriefError::config(
                "Invalid Gemini API key format (should start with 'AIza')",
            ));
        }

        if !RecencyWindow::CHOICES.contains(&self.default_days) {
            return Err(GitBriefError::config(format!(
                "default_days must be one of {:?}",
                RecencyWindow::CHOICES
            )));
        }

        if self.model.is_empty() {
            return Err(GitBriefError::config("model must not be empty"));
        }

        Ok(())
    }

    /// Resolve the Gemini API key: GEMINI_API_KEY env var wins over the config file
    pub fn get_api_key(&self) -> Result<String> {
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                return Ok(key);
            }
        }

        if self.gemini_api_key.is_empty() || self.gemini_api_key == API_KEY_PLACEHOLDER {
            return Err(GitBriefError::MissingConfig(
                "gemini_api_key is not set (set GEMINI_API_KEY or edit the config file)"
                    .to_string(),
            ));
        }

        Ok(self.gemini_api_key.clone())
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load_or_create_default() -> Result<Self> {
        match Self::load() {
            Ok(config) => Ok(config),
            Err(GitBriefError::Config(_)) => {
                eprintln!("Config file not found. Creating default config...");
                Self::create_default()
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::from(API_KEY_PLACEHOLDER),
            github_token: None,
            default_days: default_days(),
            show_all: false,
            model: default_model(),
        }
    }
}

// Serde default functions
fn default_days() -> u32 {
    1 // last 24 hours
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_days, 1);
        assert!(!config.show_all);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        let mut config = Config::default();
        config.gemini_api_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_api_key() {
        let mut config = Config::default();
        config.gemini_api_key = String::from("invalid-key");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_days() {
        let mut config = Config::default();
        config.default_days = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_valid() {
        let mut config = Config::default();
        config.gemini_api_key = String::from("AIzaSyValidKey123");
        config.default_days = 7;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("gemini_api_key"));
        assert!(toml_str.contains("default_days"));
        assert!(toml_str.contains("model"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            gemini_api_key = "AIzaSyTestKey"
            default_days = 3
            show_all = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gemini_api_key, "AIzaSyTestKey");
        assert_eq!(config.default_days, 3);
        assert!(config.show_all);
        assert_eq!(config.model, "gemini-2.0-flash");
    }
}
