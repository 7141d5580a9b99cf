use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{
    DEFAULT_ACTION_ITEM_PROMPT, DEFAULT_AUTO_REPLY_PROMPT, DEFAULT_CATEGORIZATION_PROMPT,
    PromptTemplate, RetryConfig,
};
use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_INITIAL_BACKOFF_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF_SECS, DEFAULT_MODEL, REQUEST_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Prompt templates, each with one {email_content} slot
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// Chat completion endpoint (OpenRouter or any OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; the environment and the keyring take precedence
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Timeout for a single request attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts for rate-limited or timed-out requests
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::new(
            self.max_attempts,
            Duration::from_secs(self.initial_backoff_secs),
            Duration::from_secs(self.max_backoff_secs),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default = "default_categorization_prompt")]
    pub categorization: PromptTemplate,
    #[serde(default = "default_action_item_prompt")]
    pub action_items: PromptTemplate,
    #[serde(default = "default_auto_reply_prompt")]
    pub auto_reply: PromptTemplate,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            categorization: default_categorization_prompt(),
            action_items: default_action_item_prompt(),
            auto_reply: default_auto_reply_prompt(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_initial_backoff_secs() -> u64 {
    DEFAULT_INITIAL_BACKOFF_SECS
}

fn default_max_backoff_secs() -> u64 {
    DEFAULT_MAX_BACKOFF_SECS
}

fn default_categorization_prompt() -> PromptTemplate {
    PromptTemplate::builtin(DEFAULT_CATEGORIZATION_PROMPT)
}

fn default_action_item_prompt() -> PromptTemplate {
    PromptTemplate::builtin(DEFAULT_ACTION_ITEM_PROMPT)
}

fn default_auto_reply_prompt() -> PromptTemplate {
    PromptTemplate::builtin(DEFAULT_AUTO_REPLY_PROMPT)
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("mailagent");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::info!(
                "No config file at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let dir = Self::config_dir()?;

        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        Ok(())
    }
}
