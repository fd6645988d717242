//! Relay configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret every submission must present. Required.
    #[serde(default)]
    pub expected_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_path: default_database_path() }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tasks.db")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_web_url")]
    pub web_url: String,
    #[serde(default)]
    pub token: String,
    /// Organisation to create repositories under; the token's user when unset.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            web_url: default_web_url(),
            token: String::new(),
            owner: None,
            branch: default_branch(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_author_name() -> String {
    "task-pages-relay".to_string()
}

fn default_author_email() -> String {
    "task-pages-relay@users.noreply.github.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    /// Notify from a spawned task instead of inside the request.
    #[serde(default)]
    pub background: bool,
}

impl NotifierConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            background: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    6
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Parent of per-request scratch directories; the system temp dir when unset.
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// json or text
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl RelayConfig {
    /// Reads `path` if given, applies environment overrides, then validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RelayError::InvalidConfig(e.to_string()))
    }

    /// Environment overrides. `lookup` is injected so tests don't touch the process env.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("RELAY_BIND") {
            self.server.bind = bind;
        }
        if let Some(secret) = lookup("EXPECTED_SECRET") {
            self.auth.expected_secret = secret;
        }
        if let Some(path) = lookup("RELAY_DATABASE") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(token) = lookup("GITHUB_TOKEN") {
            self.github.token = token;
        }
        if let Some(owner) = lookup("GITHUB_OWNER") {
            self.github.owner = Some(owner);
        }
        if let Some(api_url) = lookup("GITHUB_API_URL") {
            self.github.api_url = api_url;
        }
        if let Some(dir) = lookup("RELAY_SCRATCH_DIR") {
            self.workspace.scratch_root = Some(PathBuf::from(dir));
        }
        if let Some(format) = lookup("RELAY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.expected_secret.is_empty() {
            return Err(RelayError::InvalidConfig(
                "auth.expected_secret must be set (or EXPECTED_SECRET)".to_string(),
            ));
        }
        if self.notifier.max_attempts == 0 {
            return Err(RelayError::InvalidConfig("notifier.max_attempts must be at least 1".to_string()));
        }
        if self.notifier.attempt_timeout_secs == 0 || self.github.request_timeout_secs == 0 {
            return Err(RelayError::InvalidConfig("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}
