//! Configuration management for critique
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CRITIQUE_*)
//! 3. Config file (~/.config/critique/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::secrets::Secrets;
use crate::{Error, Result};

/// Default OpenAI-compatible API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Remote API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the chat-completions API
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout; `None` leaves the transport default in place
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            temperature: 0.2,
            timeout: None,
        }
    }
}

impl ApiConfig {
    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))?;

        // Url::join drops the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join("chat/completions")
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {}", self.base_url, e)))
    }
}

/// What to do with a source file larger than `max_file_chars`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OversizePolicy {
    /// Send the whole file and print a cost warning
    #[default]
    Warn,
    /// Send only the first `max_file_chars` characters
    Truncate,
    /// Refuse to send the file
    Reject,
}

impl FromStr for OversizePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "truncate" => Ok(Self::Truncate),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown oversize policy '{}' (expected warn, truncate or reject)",
                other
            )),
        }
    }
}

impl std::fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Warn => "warn",
            Self::Truncate => "truncate",
            Self::Reject => "reject",
        };
        write!(f, "{}", s)
    }
}

/// Review-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Size above which the oversize policy applies.
    /// Roughly 3000 input tokens at four characters per token.
    pub max_file_chars: usize,

    /// Oversize policy
    pub oversize: OversizePolicy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_file_chars: 12_000,
            oversize: OversizePolicy::Warn,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,

    /// Review configuration
    pub review: ReviewConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub oversize: Option<OversizePolicy>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/critique/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("critique").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CRITIQUE_MODEL: Model to use
    /// - CRITIQUE_BASE_URL: API root
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(model) = lookup("CRITIQUE_MODEL").filter(|m| !m.trim().is_empty()) {
            self.api.model = model;
        }

        if let Some(url) = lookup("CRITIQUE_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.api.model = model;
        }

        if let Some(url) = overrides.base_url {
            self.api.base_url = url;
        }

        if let Some(policy) = overrides.oversize {
            self.review.oversize = policy;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults. An explicit `path`
    /// replaces the default location and must exist.
    pub fn load_with_overrides(path: Option<&Path>, overrides: CliOverrides) -> Result<Self> {
        let base = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        let config = base.with_env_overrides().with_cli_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail only once the request is sent
    pub fn validate(&self) -> Result<()> {
        if self.api.model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }

        if self.api.max_tokens == 0 {
            return Err(Error::Config("max_tokens must be positive".to_string()));
        }

        if self.review.max_file_chars == 0 {
            return Err(Error::Config("max_file_chars must be positive".to_string()));
        }

        if !(0.0..=2.0).contains(&self.api.temperature) {
            return Err(Error::Config(format!(
                "temperature {} is outside 0.0..=2.0",
                self.api.temperature
            )));
        }

        self.api.completions_url()?;
        Ok(())
    }
}

/// Resolved request settings, built once at startup
///
/// This is what the completion client is constructed from; nothing is read
/// from the environment after it exists.
#[derive(Clone)]
pub struct Settings {
    /// API credential, if one was found
    pub api_key: Option<String>,
    /// Chat-completions endpoint
    pub endpoint: Url,
    /// Model identifier
    pub model: String,
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Combine configuration and secrets
    pub fn resolve(config: &Config, secrets: &Secrets) -> Result<Self> {
        Ok(Self {
            api_key: secrets.openai_api_key(),
            endpoint: config.api.completions_url()?,
            model: config.api.model.clone(),
            max_tokens: config.api.max_tokens,
            temperature: config.api.temperature,
            timeout: config.api.timeout,
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}
