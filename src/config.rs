use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub loader: LoaderConfig,
    pub web: WebConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct LoaderConfig {
    pub webdriver_url: String,
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Default, Deserialize)]
pub struct AiConfig {
    /// "openai" or "anthropic"; absent means AI generation is not configured.
    pub provider: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,
    #[serde(default = "default_anthropic_url")]
    pub anthropic_base_url: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    // Loaded from env
    #[serde(skip)]
    pub api_key: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_text =
            std::fs::read_to_string("config.toml").context("Failed to read config.toml")?;
        let mut config: AppConfig =
            toml::from_str(&config_text).context("Failed to parse config.toml")?;

        // Which env var holds the key depends on the configured provider.
        match config.ai.provider.as_deref() {
            Some("openai") => {
                config.ai.api_key =
                    std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
            }
            Some("anthropic") => {
                config.ai.api_key =
                    std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY not set")?;
            }
            Some(other) => anyhow::bail!("Unknown AI provider in config.toml: {}", other),
            None => {}
        }

        Ok(config)
    }
}
