use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = ".pr-describer.toml";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Input required and not supplied: {0}")]
    MissingInput(&'static str),
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// The three action inputs, validated as present and non-empty.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub openai_api_key: Secret,
    pub prompt: String,
    pub github_token: Secret,
}

impl Inputs {
    /// Build inputs from raw CLI/env values. An empty string counts as
    /// missing, since the runner exports unset inputs as empty variables.
    pub fn new(
        openai_api_key: Option<Secret>,
        prompt: Option<String>,
        github_token: Option<Secret>,
    ) -> Result<Inputs, ConfigError> {
        let openai_api_key = openai_api_key
            .filter(|key| !key.expose().is_empty())
            .ok_or(ConfigError::MissingInput("openai_api_key"))?;
        let prompt = prompt
            .filter(|prompt| !prompt.is_empty())
            .ok_or(ConfigError::MissingInput("prompt"))?;
        let github_token = github_token
            .filter(|token| !token.expose().is_empty())
            .ok_or(ConfigError::MissingInput("github_token"))?;

        Ok(Inputs {
            openai_api_key,
            prompt,
            github_token,
        })
    }
}

/// Optional endpoint overrides loaded from .pr-describer.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// REST API root. If None, falls back to GITHUB_API_URL env var.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    /// API root. If None, falls back to OPENAI_BASE_URL env var.
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from `path`, returning the default config if the
    /// file doesn't exist. Empty fields are then filled from the environment.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        if config.github.api_url.is_none() {
            config.github.api_url = non_empty_env("GITHUB_API_URL");
        }
        if config.openai.base_url.is_none() {
            config.openai.base_url = non_empty_env("OPENAI_BASE_URL");
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn github_api_url(&self) -> &str {
        self.github
            .api_url
            .as_deref()
            .unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    pub fn openai_base_url(&self) -> &str {
        self.openai
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}
