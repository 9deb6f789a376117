use std::time::Instant;

use crate::{RawSample, VelocityRecord};

/// Estimates a job's processing rate from consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityEstimator {
    default_velocity: f64,
}

impl VelocityEstimator {
    pub fn new(default_velocity: f64) -> Self {
        Self { default_velocity }
    }

    pub fn default_velocity(&self) -> f64 {
        self.default_velocity
    }

    /// Produces the velocity record for `sample`, observed at `observed_at`.
    ///
    /// A job that is not advancing gets a zero velocity. The first advancing
    /// sample of a job (no `previous` record) starts at the default velocity so
    /// the display animates before a real rate can be measured. After that the
    /// measured rate is used when it is positive; a stall or a reported
    /// regression keeps the previous non-zero rate.
    pub fn estimate(
        &self,
        previous: Option<&VelocityRecord>,
        sample: &RawSample,
        observed_at: Instant,
    ) -> VelocityRecord {
        let encoded = sample.encoded as f64;
        let velocity = if !sample.is_advancing() {
            0.0
        } else {
            match previous {
                None => self.default_velocity,
                Some(previous) => {
                    let delta_t = observed_at
                        .saturating_duration_since(previous.last_observed_at)
                        .as_secs_f64();
                    let delta_units = encoded - previous.last_observed_encoded;
                    let measured = if delta_t > 0.0 {
                        delta_units / delta_t
                    } else {
                        0.0
                    };
                    if measured > 0.0 && measured.is_finite() {
                        measured
                    } else {
                        self.retained(previous)
                    }
                }
            }
        };

        VelocityRecord {
            velocity,
            last_observed_encoded: encoded,
            last_observed_at: observed_at,
        }
    }

    // A record that was paused at zero has nothing to retain.
    fn retained(&self, previous: &VelocityRecord) -> f64 {
        if previous.velocity > 0.0 {
            previous.velocity
        } else {
            self.default_velocity
        }
    }
}
