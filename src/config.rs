use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::db::Db;
use crate::toast::DEFAULT_TTL;

pub const DEFAULT_DATABASE_URL: &str = "file://minedash.db";

pub const ENV_DATABASE_URL: &str = "MINEDASH_DATABASE_URL";
pub const ENV_USER: &str = "MINEDASH_USER";
pub const ENV_TOAST_TTL_MS: &str = "MINEDASH_TOAST_TTL_MS";

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Accepts `memory://` or `file://path/to/db.sqlite`. A relative path is
    /// written `file://name.db`, where the url crate sees `name.db` as the
    /// host, so host and path are joined back together.
    pub fn parse(url_str: &str) -> Result<Self> {
        let url = Url::parse(url_str).with_context(|| format!("Invalid database URL: {}", url_str))?;

        match url.scheme() {
            "memory" => Ok(DatabaseLocation::Memory),
            "file" => {
                let path = match (url.host_str().unwrap_or(""), url.path()) {
                    ("", path) => path.to_string(),
                    (host, "/") => host.to_string(),
                    (host, path) => format!("{}{}", host, path),
                };
                if path.is_empty() || path == "/" {
                    return Err(anyhow!("file:// URL must include a path"));
                }
                Ok(DatabaseLocation::File(PathBuf::from(path)))
            }
            scheme => Err(anyhow!(
                "Unsupported database URL scheme: {}. Use memory:// or file://",
                scheme
            )),
        }
    }

    pub fn open(&self) -> Result<Db> {
        match self {
            DatabaseLocation::Memory => Db::open_memory(),
            DatabaseLocation::File(path) => Db::open(path)
                .with_context(|| format!("Failed to open database at {}", path.display())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    /// Caller to sign in as. Without one, lists are refused and mutations
    /// fail as not authenticated.
    pub user: Option<String>,
    pub toast_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            user: None,
            toast_ttl: DEFAULT_TTL,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds a config from a variable lookup. Unset or blank variables keep
    /// their defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let set = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = set(ENV_DATABASE_URL) {
            config.database_url = url;
        }
        config.user = set(ENV_USER);
        if let Some(ms) = set(ENV_TOAST_TTL_MS) {
            let ms: u64 = ms
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds, got {:?}", ENV_TOAST_TTL_MS, ms))?;
            config.toast_ttl = Duration::from_millis(ms);
        }
        Ok(config)
    }

    pub fn database(&self) -> Result<DatabaseLocation> {
        DatabaseLocation::parse(&self.database_url)
    }
}
