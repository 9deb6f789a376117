use std::time::Duration;

use thiserror::Error;

/// Status poll cadence for latency-sensitive deployments.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Slower cadence kept for deployments that do not need fast feedback.
pub const LEGACY_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Roughly 3 Hz.
pub const DEFAULT_ANIMATION_INTERVAL: Duration = Duration::from_millis(333);
/// Units per second assumed for a job's first processing sample.
pub const DEFAULT_VELOCITY: f64 = 1.5;
/// 100% is reserved for a job the server reports as completed.
pub const DISPLAY_PERCENTAGE_CAP: f64 = 99.9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },
    #[error("default velocity must be a positive number, got {0}")]
    DefaultVelocity(f64),
    #[error("percentage cap must lie strictly between 0 and 100, got {0}")]
    PercentageCap(f64),
}

/// Tuning parameters for polling and progress smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub animation_interval: Duration,
    pub default_velocity: f64,
    pub percentage_cap: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            animation_interval: DEFAULT_ANIMATION_INTERVAL,
            default_velocity: DEFAULT_VELOCITY,
            percentage_cap: DISPLAY_PERCENTAGE_CAP,
        }
    }
}

impl TrackerConfig {
    /// Same as the default but polling at the legacy 10 second cadence.
    pub fn legacy() -> Self {
        Self {
            poll_interval: LEGACY_POLL_INTERVAL,
            ..Self::default()
        }
    }

    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "poll interval",
            });
        }
        if self.animation_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "animation interval",
            });
        }
        if !self.default_velocity.is_finite() || self.default_velocity <= 0.0 {
            return Err(ConfigError::DefaultVelocity(self.default_velocity));
        }
        if !(self.percentage_cap > 0.0 && self.percentage_cap < 100.0) {
            return Err(ConfigError::PercentageCap(self.percentage_cap));
        }
        Ok(self)
    }
}
