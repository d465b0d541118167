//! RON configuration for the worker binaries.
//!
//! Every key is optional; omitted keys take the defaults below and unknown
//! keys are rejected.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use urlcheck_core::{SELF_TERMINAL_DOMAINS, TERMINAL_REDIRECT_DOMAINS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Where the queue lives and which tubes a binary reads and writes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub host: String,
    pub port: u16,
    /// Redis database index.
    pub space: u32,
    pub input_tube: String,
    pub output_tube: String,
    /// Prefix of every Redis key.
    pub prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            space: 0,
            input_tube: "check_urls".to_string(),
            output_tube: "check_urls_results".to_string(),
            prefix: "urlcheck".to_string(),
        }
    }
}

impl QueueConfig {
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.space)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DomainConfig {
    /// Redirect targets that end a chain.
    pub terminal_redirects: Vec<String>,
    /// Start URLs that are never fetched.
    pub self_terminal: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            terminal_redirects: TERMINAL_REDIRECT_DOMAINS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
            self_terminal: SELF_TERMINAL_DOMAINS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
        }
    }
}

/// An extra counter signature appended to the built-in ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CounterConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    pub terminal: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            terminal: true,
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub queue: QueueConfig,
    pub http_timeout_secs: u64,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
    pub worker_pool_size: usize,
    /// Probed before workers are started; any answer counts as "network up".
    pub check_url: String,
    pub sleep_secs: u64,
    pub sleep_on_fail_secs: u64,
    pub queue_take_timeout_secs: u64,
    pub domains: DomainConfig,
    pub extra_counters: Vec<CounterConfig>,
    pub log: LogConfig,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            http_timeout_secs: 15,
            max_redirects: 30,
            user_agent: None,
            worker_pool_size: 10,
            check_url: "https://www.google.com/".to_string(),
            sleep_secs: 10,
            sleep_on_fail_secs: 10,
            queue_take_timeout_secs: 1,
            domains: DomainConfig::default(),
            extra_counters: Vec::new(),
            log: LogConfig::default(),
        }
    }
}

impl CheckerConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PusherConfig {
    pub queue: QueueConfig,
    pub http_timeout_secs: u64,
    pub worker_pool_size: usize,
    pub sleep_secs: u64,
    pub sleep_on_fail_secs: u64,
    pub queue_take_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
    pub log: LogConfig,
}

impl Default for PusherConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig {
                input_tube: "notifications".to_string(),
                output_tube: String::new(),
                ..QueueConfig::default()
            },
            http_timeout_secs: 10,
            worker_pool_size: 10,
            sleep_secs: 1,
            sleep_on_fail_secs: 10,
            queue_take_timeout_secs: 1,
            shutdown_timeout_secs: 30,
            log: LogConfig::default(),
        }
    }
}

/// Read and parse a RON config file.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
