//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;
use crate::infrastructure::http::{DEFAULT_USER_AGENT, HttpFetcherConfig};
use crate::infrastructure::image::codec::DEFAULT_MAX_ALLOC;
use crate::infrastructure::image::{DecodeLimits, ImageResolverConfig};

pub(super) const APP_NAME: &str = "slidecache";
pub(super) const APP_QUALIFIER: &str = "com";
pub(super) const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration loaded from `config.toml` and CLI arguments.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log file path.
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Cache location.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fetch collaborator settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Decoder limits.
    #[serde(default)]
    pub decode: DecodeConfig,
}

/// Cache location configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Explicit cache root.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Host storage root; the cache lives under `<storage_path>/slidecache/images`
    /// when `dir` is unset.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

/// Fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum background fetches running at once.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

/// Decoder limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Maximum bytes a single decode may allocate.
    #[serde(default = "default_max_alloc_bytes")]
    pub max_alloc_bytes: u64,

    /// Maximum width and height in pixels.
    #[serde(default)]
    pub max_dimension: Option<u32>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_alloc_bytes: default_max_alloc_bytes(),
            max_dimension: None,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_max_concurrent_fetches() -> usize {
    4
}

const fn default_max_alloc_bytes() -> u64 {
    DEFAULT_MAX_ALLOC
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.cache.dir = Some(cache_dir.clone());
        }
        if let Some(timeout) = args.timeout_secs {
            self.fetch.timeout_secs = timeout;
        }
        if let Some(max) = args.max_concurrent_fetches {
            self.fetch.max_concurrent_fetches = max;
        }
    }

    /// Returns the default cache root (`<cache dir>/images`).
    #[must_use]
    pub fn default_cache_dir() -> PathBuf {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
            || std::env::temp_dir().join(APP_NAME).join("cache").join("images"),
            |dirs| dirs.cache_dir().join("images"),
        )
    }

    /// Returns the cache root: explicit dir, then storage path, then default.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache.dir {
            return dir.clone();
        }
        self.cache.storage_path.as_ref().map_or_else(Self::default_cache_dir, |storage| {
            storage.join(APP_NAME).join("images")
        })
    }

    /// Returns the log file path, if file logging is configured.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone()
    }

    /// Settings for the HTTP fetcher.
    #[must_use]
    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            timeout_secs: self.fetch.timeout_secs,
            user_agent: self.fetch.user_agent.clone(),
        }
    }

    /// Settings for the image resolver.
    #[must_use]
    pub fn resolver_config(&self) -> ImageResolverConfig {
        ImageResolverConfig {
            max_concurrent_fetches: self.fetch.max_concurrent_fetches,
            decode_limits: DecodeLimits {
                max_alloc: self.decode.max_alloc_bytes,
                max_dimension: self.decode.max_dimension,
            },
        }
    }
}
