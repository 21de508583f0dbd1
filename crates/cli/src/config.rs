use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub rewrite: RewriteConfig,
    #[serde(default)]
    pub limits: LimitConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RewriteConfig {
    pub provider: String,
    pub model: String,
    pub fallback_provider: Option<String>,
    pub fallback_model: Option<String>,
    pub chunk_size: usize,
    pub classify: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LimitConfig {
    pub calls_per_minute: usize,
    pub max_parallel: usize,
    pub request_timeout_secs: u64,
    pub retries: u32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            fallback_provider: None,
            fallback_model: None,
            chunk_size: 10,
            classify: true,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            calls_per_minute: 60,
            max_parallel: 4,
            request_timeout_secs: 120,
            retries: 3,
        }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    pub async fn load() -> Result<Self> {
        let config_path = Self::get_config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path();

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["rewrite", "provider"] => {
                self.rewrite.provider = value.to_string();
            }
            ["rewrite", "model"] => {
                self.rewrite.model = value.to_string();
            }
            ["rewrite", "fallback_provider"] => {
                self.rewrite.fallback_provider = optional(value);
            }
            ["rewrite", "fallback_model"] => {
                self.rewrite.fallback_model = optional(value);
            }
            ["rewrite", "chunk_size"] => {
                self.rewrite.chunk_size = value
                    .parse::<usize>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            ["rewrite", "classify"] => {
                self.rewrite.classify = value
                    .parse::<bool>()
                    .map_err(|_| eyre::eyre!("Invalid boolean value: {}", value))?;
            }
            ["limits", "calls_per_minute"] => {
                self.limits.calls_per_minute = value
                    .parse::<usize>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            ["limits", "max_parallel"] => {
                self.limits.max_parallel = value
                    .parse::<usize>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            ["limits", "request_timeout_secs"] => {
                self.limits.request_timeout_secs = value
                    .parse::<u64>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            ["limits", "retries"] => {
                self.limits.retries = value
                    .parse::<u32>()
                    .map_err(|_| eyre::eyre!("Invalid number: {}", value))?;
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        let value = match parts.as_slice() {
            ["rewrite", "provider"] => self.rewrite.provider.clone(),
            ["rewrite", "model"] => self.rewrite.model.clone(),
            ["rewrite", "fallback_provider"] => {
                self.rewrite.fallback_provider.clone().unwrap_or_default()
            }
            ["rewrite", "fallback_model"] => {
                self.rewrite.fallback_model.clone().unwrap_or_default()
            }
            ["rewrite", "chunk_size"] => self.rewrite.chunk_size.to_string(),
            ["rewrite", "classify"] => self.rewrite.classify.to_string(),
            ["limits", "calls_per_minute"] => self.limits.calls_per_minute.to_string(),
            ["limits", "max_parallel"] => self.limits.max_parallel.to_string(),
            ["limits", "request_timeout_secs"] => self.limits.request_timeout_secs.to_string(),
            ["limits", "retries"] => self.limits.retries.to_string(),
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        };

        Ok(value)
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             Rewrite:\n\
             ├─ provider: {}\n\
             ├─ model: {}\n\
             ├─ fallback_provider: {}\n\
             ├─ fallback_model: {}\n\
             ├─ chunk_size: {}\n\
             └─ classify: {}\n\
             Limits:\n\
             ├─ calls_per_minute: {}\n\
             ├─ max_parallel: {}\n\
             ├─ request_timeout_secs: {}\n\
             └─ retries: {}",
            self.rewrite.provider,
            self.rewrite.model,
            self.rewrite
                .fallback_provider
                .as_deref()
                .unwrap_or("(not set)"),
            self.rewrite
                .fallback_model
                .as_deref()
                .unwrap_or("(not set)"),
            self.rewrite.chunk_size,
            self.rewrite.classify,
            self.limits.calls_per_minute,
            self.limits.max_parallel,
            self.limits.request_timeout_secs,
            self.limits.retries,
        )
    }

    pub async fn reset() -> Result<Self> {
        let config = Self::default();
        config.save().await?;
        Ok(config)
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "retold", "retold") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        // Fallback to current directory if we can't determine project dirs
        PathBuf::from(".retold").join("config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut config = Config::default();

        config.set_value("rewrite.provider", "anthropic").unwrap();
        config.set_value("rewrite.chunk_size", "5").unwrap();
        config.set_value("limits.max_parallel", "2").unwrap();

        assert_eq!(config.get_value("rewrite.provider").unwrap(), "anthropic");
        assert_eq!(config.get_value("rewrite.chunk_size").unwrap(), "5");
        assert_eq!(config.get_value("limits.max_parallel").unwrap(), "2");
    }

    #[test]
    fn empty_fallback_clears_the_value() {
        let mut config = Config::default();

        config
            .set_value("rewrite.fallback_provider", "together")
            .unwrap();
        assert_eq!(
            config.rewrite.fallback_provider.as_deref(),
            Some("together")
        );

        config.set_value("rewrite.fallback_provider", "").unwrap();
        assert_eq!(config.rewrite.fallback_provider, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("rewrite.nope", "x").is_err());
        assert!(config.get_value("nope").is_err());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut config = Config::default();
        assert!(config.set_value("rewrite.chunk_size", "many").is_err());
        assert!(config.set_value("rewrite.classify", "yes-please").is_err());
    }

    #[test]
    fn serialized_config_round_trips() {
        let mut config = Config::default();
        config.set_value("rewrite.model", "claude-sonnet").unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.rewrite.model, "claude-sonnet");
        assert_eq!(restored.limits.retries, config.limits.retries);
    }
}
