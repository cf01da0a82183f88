//! Monitor configuration loading and validation.
//!
//! Configuration is read from a YAML file. Every field is required; a
//! missing target or interval is a startup failure, never a silent default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Top-level monitor configuration.
///
/// Key names match the historical `monitor.yml` surface:
///
/// ```yaml
/// icmpDestHost: 1.1.1.1
/// downloadURL: http://example.com/512MB.zip
/// uploadURL: https://file.io/?expires=1d
/// logLevel: INFO
/// jobs:
///   ping:
///     interval: 120
///   download:
///     interval: 3600
///   upload:
///     interval: 3600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Host or IP address targeted by the ICMP probe
    #[serde(rename = "icmpDestHost")]
    pub icmp_dest_host: String,

    /// URL fetched by the download probe
    #[serde(rename = "downloadURL")]
    pub download_url: String,

    /// URL the upload probe POSTs the scratch payload to
    #[serde(rename = "uploadURL")]
    pub upload_url: String,

    /// Process log level
    #[serde(rename = "logLevel")]
    pub log_level: LogLevel,

    /// Per-job schedule settings
    pub jobs: JobsConfig,
}

/// Interval settings for the three probe jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    pub ping: JobConfig,
    pub download: JobConfig,
    pub upload: JobConfig,
}

/// Schedule settings for a single probe job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Seconds between ticks
    pub interval: u64,
}

/// Process log level, accepted in upper or lower case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    #[serde(alias = "error")]
    Error,
    #[serde(alias = "warn")]
    Warn,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "trace")]
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl MonitorConfig {
    /// Load and validate a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)
            .map_err(|e| MonitorError::config_error(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would start the agent with empty targets
    /// or a zero interval.
    pub fn validate(&self) -> Result<()> {
        if self.icmp_dest_host.trim().is_empty() {
            return Err(MonitorError::config_error("icmpDestHost must not be empty"));
        }

        for (key, url) in [("downloadURL", &self.download_url), ("uploadURL", &self.upload_url)] {
            reqwest::Url::parse(url).map_err(|e| {
                MonitorError::config_error(format!("{} is not a valid URL: {}", key, e))
            })?;
        }

        for (name, job) in [
            ("ping", &self.jobs.ping),
            ("download", &self.jobs.download),
            ("upload", &self.jobs.upload),
        ] {
            if job.interval == 0 {
                return Err(MonitorError::config_error(format!(
                    "jobs.{}.interval must be at least 1 second",
                    name
                )));
            }
        }

        Ok(())
    }
}
