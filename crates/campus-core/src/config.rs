//! Configuration management for the Campus console.
//!
//! Loads configuration from ${CAMPUS_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default base URL for the resource API.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
/// Default base URL for the password login endpoint.
pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8080/api/auth";
/// Default identity-provider sign-in URL.
pub const DEFAULT_OAUTH_AUTHORIZE_URL: &str = "http://localhost:8080/oauth2/authorization/google";

/// Reaction to an HTTP 401 from the resource API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnauthorizedPolicy {
    /// Report the failure to the caller and keep the stored session.
    #[default]
    Surface,
    /// Report the failure and clear the stored session.
    ClearSession,
}

/// Console entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    pub login: String,
    /// Where an authenticated user lands when there is no origin to restore.
    pub default_entry: String,
    /// Fixed path the identity provider redirects back to.
    pub oauth_redirect: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            default_entry: "/dashboard".to_string(),
            oauth_redirect: "/oauth2/redirect".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub auth_base_url: String,
    pub oauth_authorize_url: String,

    /// Grace delay (ms) between persisting a redirect session and navigating.
    pub redirect_grace_ms: u64,

    pub unauthorized_policy: UnauthorizedPolicy,

    #[serde(default)]
    pub routes: RoutesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            oauth_authorize_url: DEFAULT_OAUTH_AUTHORIZE_URL.to_string(),
            redirect_grace_ms: Self::DEFAULT_REDIRECT_GRACE_MS,
            unauthorized_policy: UnauthorizedPolicy::default(),
            routes: RoutesConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_REDIRECT_GRACE_MS: u64 = 100;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Resource API base URL.
    ///
    /// Resolution order:
    /// 1. `CAMPUS_API_BASE_URL` env var (if set and non-empty)
    /// 2. `api_base_url` from config (if non-empty)
    /// 3. Default: `http://localhost:8080/api`
    ///
    /// # Errors
    /// Returns an error if the resolved value is not a valid URL.
    pub fn effective_api_base_url(&self) -> Result<String> {
        resolve_base_url(
            Some(&self.api_base_url),
            "CAMPUS_API_BASE_URL",
            DEFAULT_API_BASE_URL,
            "API",
        )
    }

    /// Login endpoint base URL (`CAMPUS_AUTH_BASE_URL` overrides config).
    ///
    /// # Errors
    /// Returns an error if the resolved value is not a valid URL.
    pub fn effective_auth_base_url(&self) -> Result<String> {
        resolve_base_url(
            Some(&self.auth_base_url),
            "CAMPUS_AUTH_BASE_URL",
            DEFAULT_AUTH_BASE_URL,
            "auth",
        )
    }

    pub fn redirect_grace(&self) -> Duration {
        Duration::from_millis(self.redirect_grace_ms)
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    label: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, label)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, label)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, label: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {label} base URL: {url}"))?;
    Ok(())
}

pub mod paths {
    //! Path resolution for Campus configuration and session data.
    //!
    //! CAMPUS_HOME resolution order:
    //! 1. CAMPUS_HOME environment variable (if set)
    //! 2. ~/.config/campus (default)

    use std::path::PathBuf;

    /// Returns the Campus home directory.
    pub fn campus_home() -> PathBuf {
        if let Ok(home) = std::env::var("CAMPUS_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".campus"),
            |h| h.join(".config").join("campus"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        campus_home().join("config.toml")
    }

    /// Returns the path to the persisted session record.
    pub fn session_path() -> PathBuf {
        campus_home().join("session.json")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.routes.login, "/login");
        assert_eq!(config.routes.default_entry, "/dashboard");
        assert_eq!(config.redirect_grace(), Duration::from_millis(100));
        assert_eq!(config.unauthorized_policy, UnauthorizedPolicy::Surface);
    }

    #[test]
    fn test_default_template_parses_to_defaults() {
        let parsed: Config = toml::from_str(default_config_template()).unwrap();
        let defaults = Config::default();

        assert_eq!(parsed.api_base_url, defaults.api_base_url);
        assert_eq!(parsed.auth_base_url, defaults.auth_base_url);
        assert_eq!(parsed.oauth_authorize_url, defaults.oauth_authorize_url);
        assert_eq!(parsed.redirect_grace_ms, defaults.redirect_grace_ms);
        assert_eq!(parsed.routes, defaults.routes);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "redirect_grace_ms = 0\nunauthorized_policy = \"clear_session\"\n[routes]\nlogin = \"/signin\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.redirect_grace_ms, 0);
        assert_eq!(config.unauthorized_policy, UnauthorizedPolicy::ClearSession);
        assert_eq!(config.routes.login, "/signin");
        assert_eq!(config.routes.default_entry, "/dashboard");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::init(&path).unwrap();
        assert!(path.exists());
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        // Only meaningful when the env override is absent.
        if std::env::var("CAMPUS_API_BASE_URL").is_err() {
            assert!(config.effective_api_base_url().is_err());
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Config {
            auth_base_url: "http://auth.example/api/auth/".to_string(),
            ..Config::default()
        };
        if std::env::var("CAMPUS_AUTH_BASE_URL").is_err() {
            assert_eq!(
                config.effective_auth_base_url().unwrap(),
                "http://auth.example/api/auth"
            );
        }
    }
}
