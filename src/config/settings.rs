//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::{ModelPreset, SamplingParams};

/// Environment variable consulted when no token is configured.
pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Inference provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Default sampling parameters
    #[serde(default)]
    pub generation: GenerationSettings,

    /// Web form settings
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Inference provider (replicate)
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API token (r8_...)
    #[serde(default)]
    pub api_token: String,

    /// Model preset (Llama2-7B, Llama2-13B)
    #[serde(default)]
    pub model: ModelPreset,

    /// API endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Delay between prediction status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Sampling temperature (0.01 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling threshold (0.01 - 1.0)
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Maximum output length in tokens (32 - 128, step 8)
    #[serde(default = "default_max_length")]
    pub max_length: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind the web form to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the web form to
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_provider() -> String {
    "replicate".to_string()
}

fn default_llm_endpoint() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    SamplingParams::default().temperature
}

fn default_top_p() -> f32 {
    SamplingParams::default().top_p
}

fn default_max_length() -> u32 {
    SamplingParams::default().max_length
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_token: String::new(),
            model: ModelPreset::default(),
            endpoint: default_llm_endpoint(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_length: default_max_length(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl GenerationSettings {
    /// Configured defaults, clamped to the ranges the model accepts.
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            top_p: self.top_p,
            max_length: self.max_length,
        }
        .clamped()
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.llm.api_token.trim().is_empty() {
            if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
                if !token.trim().is_empty() {
                    self.llm.api_token = token;
                }
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", crate::APP_NAME, crate::APP_NAME)
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured token, if any.
    pub fn api_token(&self) -> Option<&str> {
        let token = self.llm.api_token.trim();
        (!token.is_empty()).then_some(token)
    }
}
