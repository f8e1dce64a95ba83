//! Configuration file support

use datasight_agent::{AnalystConfig, SessionLimits};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for datasight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to use
    pub model: Option<String>,
    /// Output token cap for the initial analysis
    pub summary_max_tokens: u32,
    /// Output token cap for follow-up questions
    pub followup_max_tokens: u32,
    /// Override for the API base URL
    pub base_url: Option<String>,
    /// HTTP timeout per request
    pub request_timeout_secs: u64,
    /// Python interpreter used to render charts
    pub python: Option<String>,
    pub limits: LimitsConfig,
    /// API keys (alternative to environment variables)
    pub api_keys: ApiKeys,
}

impl Default for Config {
    fn default() -> Self {
        let analyst = AnalystConfig::default();
        Self {
            model: None,
            summary_max_tokens: analyst.summary_max_tokens,
            followup_max_tokens: analyst.followup_max_tokens,
            base_url: None,
            request_timeout_secs: 120,
            python: None,
            limits: LimitsConfig::default(),
            api_keys: ApiKeys::default(),
        }
    }
}

/// Session limits. A `max_tokens` of 0 disables the token cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_turns: usize,
    pub max_tokens: u64,
    /// Defaults to 80% of `max_turns`
    pub warn_turns: Option<usize>,
    /// Defaults to 80% of `max_tokens`; ignored without a token cap
    pub warn_tokens: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            max_turns: limits.max_turns,
            max_tokens: limits.max_tokens.unwrap_or(0),
            warn_turns: None,
            warn_tokens: None,
        }
    }
}

impl From<LimitsConfig> for SessionLimits {
    fn from(cfg: LimitsConfig) -> Self {
        let max_tokens = (cfg.max_tokens > 0).then_some(cfg.max_tokens);
        let mut limits = SessionLimits::with_caps(cfg.max_turns, max_tokens);
        if let Some(turns) = cfg.warn_turns {
            limits.warn_turns = turns;
        }
        if let (Some(tokens), Some(_)) = (cfg.warn_tokens, max_tokens) {
            limits.warn_tokens = Some(tokens);
        }
        limits
    }
}

/// API key configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub anthropic: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datasight")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DATASIGHT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a file, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Write the example config if no file exists yet
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }

    /// API key from config, then `ANTHROPIC_API_KEY`
    pub fn api_key(&self) -> Option<String> {
        let configured = self
            .api_keys
            .anthropic
            .as_deref()
            .filter(|k| !k.trim().is_empty());
        datasight_ai::providers::get_api_key(configured, "ANTHROPIC_API_KEY").ok()
    }

    pub fn analyst_config(&self) -> AnalystConfig {
        AnalystConfig {
            summary_max_tokens: self.summary_max_tokens,
            followup_max_tokens: self.followup_max_tokens,
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# datasight configuration file
# Place at ~/.config/datasight/config.toml (Linux), or point DATASIGHT_CONFIG_PATH at it

# Model to use
model = "claude-sonnet-4-20250514"

# Output token caps
summary_max_tokens = 1500
followup_max_tokens = 3000

# HTTP timeout per request, in seconds
request_timeout_secs = 120

# Python interpreter used to render charts to PNG (optional)
# python = "python3"

# Custom API endpoint (optional)
# base_url = "https://api.anthropic.com"

[limits]
max_turns = 10
# 0 disables the token cap
max_tokens = 25000
# Warnings default to 80% of each cap
# warn_turns = 8
# warn_tokens = 20000

# API keys (optional - can also use ANTHROPIC_API_KEY or a .env file)
[api_keys]
# anthropic = "sk-ant-..."
"#
}
