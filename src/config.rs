//! Application configuration and file-backed credential storage.
//!
//! All configuration is resolved once at startup and passed explicitly into
//! the components that need it; nothing reads ambient process globals at use
//! time. The two runtime-updatable values — the GitHub token and the default
//! repository URL — live in single-value files under the config directory so
//! they survive restarts and can be changed through the HTTP API.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Errors from loading configuration or writing a store file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address {value:?}: {reason}")]
    InvalidListenAddr { value: String, reason: String },

    #[error("invalid idle timeout {0:?}: expected a number of seconds")]
    InvalidIdleTimeout(String),

    #[error("refusing to store an empty value")]
    EmptyValue,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Static application configuration, resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Directory holding the token and repo-URL store files.
    pub config_dir: PathBuf,

    /// Base directory for per-run working directories.
    pub work_dir: PathBuf,

    /// Base directory for archived pipeline output.
    pub archive_dir: PathBuf,

    /// Branch pull requests are opened against.
    pub base_branch: String,

    /// Prefix for generated branch names.
    pub branch_prefix: String,

    /// Model handed to the ollama CLI.
    pub ollama_model: String,

    /// Webhook HMAC secret; verification is skipped when unset.
    pub webhook_secret: Option<String>,

    /// Idle period before an actor instance deactivates.
    pub idle_timeout: Duration,

    /// Committer name for bot commits.
    pub bot_name: String,

    /// Committer email for bot commits.
    pub bot_email: String,
}

impl AppConfig {
    /// Builds the configuration from `REFACTOR_BOT_*` environment variables,
    /// with defaults suitable for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match std::env::var("REFACTOR_BOT_LISTEN") {
            Ok(value) => value
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidListenAddr {
                    value,
                    reason: e.to_string(),
                })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let data_dir = std::env::var("REFACTOR_BOT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let idle_timeout = match std::env::var("REFACTOR_BOT_IDLE_SECS") {
            Ok(value) => Duration::from_secs(
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidIdleTimeout(value))?,
            ),
            Err(_) => Duration::from_secs(300),
        };

        Ok(AppConfig {
            listen_addr,
            config_dir: data_dir.join("config"),
            work_dir: data_dir.join("work"),
            archive_dir: data_dir.join("archive"),
            base_branch: std::env::var("REFACTOR_BOT_BASE_BRANCH")
                .unwrap_or_else(|_| "main".to_string()),
            branch_prefix: std::env::var("REFACTOR_BOT_BRANCH_PREFIX")
                .unwrap_or_else(|_| "refactor-bot".to_string()),
            ollama_model: std::env::var("REFACTOR_BOT_OLLAMA_MODEL")
                .unwrap_or_else(|_| "deepseek-coder:6.7b".to_string()),
            webhook_secret: std::env::var("REFACTOR_BOT_WEBHOOK_SECRET").ok(),
            idle_timeout,
            bot_name: "Refactor Bot".to_string(),
            bot_email: "bot@refactor-bot.local".to_string(),
        })
    }
}

/// A single trimmed string value persisted in one file.
///
/// Reads go through an in-memory cache that is refreshed from disk on miss,
/// so a value written by a previous process is picked up lazily. Writes go to
/// disk first, then update the cache.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<Option<String>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// Returns the stored value, if any non-empty value exists.
    pub fn load(&self) -> Option<String> {
        if let Some(value) = self.cache.read().expect("store lock poisoned").as_ref() {
            return Some(value.clone());
        }

        let value = match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.to_string()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read store file");
                return None;
            }
        };

        *self.cache.write().expect("store lock poisoned") = Some(value.clone());
        Some(value)
    }

    /// Persists a new value, replacing any previous one.
    pub fn save(&self, value: &str) -> Result<(), ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyValue);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, trimmed)?;

        *self.cache.write().expect("store lock poisoned") = Some(trimmed.to_string());
        Ok(())
    }
}

/// File-backed GitHub token storage.
#[derive(Debug)]
pub struct TokenStore {
    store: FileStore,
}

impl TokenStore {
    /// Opens the token store under the given config directory.
    pub fn open(config_dir: &Path) -> Self {
        TokenStore {
            store: FileStore::new(config_dir.join("github.token")),
        }
    }

    pub fn github_token(&self) -> Option<String> {
        self.store.load()
    }

    pub fn set_github_token(&self, token: &str) -> Result<(), ConfigError> {
        self.store.save(token)
    }
}

/// File-backed storage for the default repository URL.
#[derive(Debug)]
pub struct RepoStore {
    store: FileStore,
}

impl RepoStore {
    /// Opens the repo-URL store under the given config directory.
    pub fn open(config_dir: &Path) -> Self {
        RepoStore {
            store: FileStore::new(config_dir.join("repo.url")),
        }
    }

    pub fn repo_url(&self) -> Option<String> {
        self.store.load()
    }

    pub fn set_repo_url(&self, url: &str) -> Result<(), ConfigError> {
        self.store.save(url)
    }
}
