// src/config.rs

//! Manages runner configuration: loading from TOML and defaulting.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Top-level configuration for the batch runner binary.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            http: HttpConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Settings applied to the HTTP client used by the default dispatcher.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HttpConfig {
    /// Total time budget for one request, including the body.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `0` disables redirect following entirely.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Network access controls for outbound requests.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Glob patterns for domains a batch may contact.
    /// If empty, all domains are allowed.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}
fn default_user_agent() -> String {
    format!("jsonbatch/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_redirects() -> usize {
    10
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;
        Ok(config)
    }
}
