use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ingest_core::{TrackerConfig, LEGACY_POLL_INTERVAL};
use ingest_engine::SamplerSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error(transparent)]
    Invalid(#[from] ingest_core::ConfigError),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

const DEFAULT_LOG_FILE: &str = "ingest_watch.log";

/// On-disk configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub status_url: String,
    pub jobs: Vec<String>,
    pub poll_interval_ms: u64,
    pub animation_interval_ms: u64,
    pub default_velocity: f64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub exit_when_idle: bool,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let tracker = TrackerConfig::default();
        let sampler = SamplerSettings::default();
        Self {
            status_url: sampler.status_url,
            jobs: Vec::new(),
            poll_interval_ms: millis(tracker.poll_interval),
            animation_interval_ms: millis(tracker.animation_interval),
            default_velocity: tracker.default_velocity,
            connect_timeout_ms: millis(sampler.connect_timeout),
            request_timeout_ms: millis(sampler.request_timeout),
            exit_when_idle: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Overlays command-line flags; jobs given on the command line are added
    /// after the ones from the file.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.status_url {
            self.status_url = url.clone();
        }
        for job in &cli.jobs {
            if !self.jobs.contains(job) {
                self.jobs.push(job.clone());
            }
        }
        if cli.legacy_poll {
            self.poll_interval_ms = millis(LEGACY_POLL_INTERVAL);
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        if let Some(ms) = cli.animation_interval_ms {
            self.animation_interval_ms = ms;
        }
        if let Some(velocity) = cli.default_velocity {
            self.default_velocity = velocity;
        }
        self.exit_when_idle |= cli.exit_when_idle;
        if let Some(path) = &cli.log_file {
            self.log_file = path.clone();
        }
        self
    }

    pub fn tracker_config(&self) -> Result<TrackerConfig, ConfigError> {
        let config = TrackerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            animation_interval: Duration::from_millis(self.animation_interval_ms),
            default_velocity: self.default_velocity,
            ..TrackerConfig::default()
        };
        Ok(config.validated()?)
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            status_url: self.status_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..SamplerSettings::default()
        }
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::new(),
        )?)
    }
}

pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
