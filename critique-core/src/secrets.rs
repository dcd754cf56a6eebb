//! Secrets management for critique
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/critique/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (OPENAI_API_KEY)
//! 2. Secrets file (~/.config/critique/secrets.toml)
//!
//! The file is not opened at all when the environment variable is set. A
//! default-location file with loose permissions is ignored with a warning
//! rather than failing the run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Secrets structure
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// OpenAI-compatible provider secrets
    pub openai: OpenAiSecrets,
}

/// Provider secrets
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiSecrets {
    /// API key
    pub api_key: Option<String>,
}

impl Secrets {
    /// Secrets holding just an API key
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            openai: OpenAiSecrets {
                api_key: Some(key.into()),
            },
        }
    }

    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(
            Self::default_secrets_path().as_deref(),
            std::env::var(API_KEY_ENV).ok().as_deref(),
        )
    }

    fn load_from(path: Option<&Path>, env_key: Option<&str>) -> Result<Self> {
        if env_key.is_some_and(|k| !k.trim().is_empty()) {
            debug!("{} is set, skipping secrets file", API_KEY_ENV);
            return Ok(Self::default());
        }

        let Some(path) = path.filter(|p| p.exists()) else {
            return Ok(Self::default());
        };

        if let Err(e) = check_permissions(path) {
            warn!(error = %e, "Ignoring secrets file");
            return Ok(Self::default());
        }

        Self::load_from_file(path)
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        check_permissions(path)?;

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut key) = secrets.openai.api_key {
            *key = key.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/critique/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("critique").join("secrets.toml"))
    }

    /// Get the API key with environment variable override
    ///
    /// Priority: OPENAI_API_KEY env var > secrets file
    pub fn openai_api_key(&self) -> Option<String> {
        resolve_api_key(
            std::env::var(API_KEY_ENV).ok().as_deref(),
            self.openai.api_key.as_deref(),
        )
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field(
                "openai.api_key",
                &self.openai.api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Refuse files readable by group or others
fn check_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = std::fs::metadata(path).map_err(Error::Io)?;
        let mode = metadata.permissions().mode();

        if mode & 0o077 != 0 {
            return Err(Error::Config(format!(
                "Secrets file {} has insecure permissions {:o}. \
                 Please run: chmod 600 {}",
                path.display(),
                mode & 0o777,
                path.display()
            )));
        }

        debug!(
            path = %path.display(),
            mode = format!("{:o}", mode & 0o777),
            "Secrets file permissions OK"
        );
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

fn resolve_api_key(from_env: Option<&str>, from_file: Option<&str>) -> Option<String> {
    if let Some(key) = from_env.map(str::trim).filter(|k| !k.is_empty()) {
        debug!("Using API key from {} environment variable", API_KEY_ENV);
        return Some(key.to_string());
    }

    if let Some(key) = from_file.map(str::trim).filter(|k| !k.is_empty()) {
        debug!("Using API key from secrets file");
        return Some(key.to_string());
    }

    None
}
