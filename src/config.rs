use crate::install::DEFAULT_WHITELIST;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API key for the Groq endpoint; the GROQ_API_KEY env var is the
    /// fallback when unset.
    pub api_key: Option<String>,
    /// Model for the chat fallback.
    pub model: String,
    /// Model for intent classification and package name resolution.
    pub classifier_model: String,
    pub temperature: f32,
    /// Directory holding the path cache and the fact log.
    pub memory_dir: PathBuf,
    /// Applications the assistant may install.
    pub whitelist: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            api_key: None,
            model: "llama3-8b-8192".to_string(),
            classifier_model: "llama3-8b-8192".to_string(),
            temperature: 0.2,
            memory_dir: PathBuf::from(home).join(".local/share/sane"),
            whitelist: DEFAULT_WHITELIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load_or_default() -> Result<Self> {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let config_path = PathBuf::from(home).join(".config/sane/config.toml");

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn cache_file(&self) -> PathBuf {
        self.memory_dir.join("install_cache.json")
    }

    pub fn fact_file(&self) -> PathBuf {
        self.memory_dir.join("memory.json")
    }
}
