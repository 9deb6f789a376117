use std::time::Instant;

use crate::{DisplayRecord, JobState, RawSample, VelocityRecord};

/// Turns raw samples and velocities into display values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    percentage_cap: f64,
}

impl Interpolator {
    pub fn new(percentage_cap: f64) -> Self {
        Self { percentage_cap }
    }

    pub fn percentage_cap(&self) -> f64 {
        self.percentage_cap
    }

    /// Extrapolates a processing job's progress to `now`.
    ///
    /// Returns `None` when nothing should be committed: the job is not
    /// processing, has no positive velocity, or the prediction does not move
    /// past what is already displayed.
    pub fn predict(
        &self,
        sample: &RawSample,
        velocity: &VelocityRecord,
        current: Option<&DisplayRecord>,
        now: Instant,
    ) -> Option<DisplayRecord> {
        if sample.state != JobState::Processing || velocity.velocity <= 0.0 {
            return None;
        }

        let elapsed = now
            .saturating_duration_since(velocity.last_observed_at)
            .as_secs_f64();
        let total = sample.total as f64;
        let predicted =
            (velocity.last_observed_encoded + velocity.velocity * elapsed).min(total);
        let predicted_percentage = if sample.total > 0 {
            (predicted / total * 100.0).min(self.percentage_cap)
        } else {
            0.0
        };

        let current = current.copied().unwrap_or_default();
        if predicted <= current.display_encoded {
            return None;
        }

        Some(DisplayRecord {
            display_encoded: predicted,
            display_percentage: predicted_percentage.max(current.display_percentage),
        })
    }

    /// Display record for a freshly committed sample.
    ///
    /// Completed jobs show 100. Failed jobs show what the server last
    /// reported, falling back to `previous_sample` when the error report
    /// carries no progress. Processing jobs never drop below
    /// `previous_display`.
    pub fn settle(
        &self,
        sample: &RawSample,
        previous_sample: Option<&RawSample>,
        previous_display: Option<&DisplayRecord>,
    ) -> DisplayRecord {
        match sample.state {
            JobState::Completed => DisplayRecord {
                display_encoded: sample.total.max(sample.encoded) as f64,
                display_percentage: 100.0,
            },
            JobState::Error => match previous_sample {
                Some(previous) if reports_no_progress(sample) => self.reported(previous),
                _ => self.reported(sample),
            },
            JobState::Processing => {
                let raw = self.reported(sample);
                match previous_display {
                    Some(previous) => DisplayRecord {
                        display_encoded: self.within_total(
                            raw.display_encoded.max(previous.display_encoded),
                            sample,
                        ),
                        display_percentage: raw
                            .display_percentage
                            .max(previous.display_percentage)
                            .min(self.percentage_cap),
                    },
                    None => raw,
                }
            }
            JobState::Unknown | JobState::Waiting => self.reported(sample),
        }
    }

    // Servers may omit `percentage`; derive it from the counts when they allow.
    fn reported(&self, sample: &RawSample) -> DisplayRecord {
        let derived = if sample.total > 0 {
            sample.encoded as f64 / sample.total as f64 * 100.0
        } else {
            0.0
        };
        DisplayRecord {
            display_encoded: sample.encoded as f64,
            display_percentage: sample.percentage.max(derived).min(self.percentage_cap),
        }
    }

    // The server may shrink `total` between samples.
    fn within_total(&self, encoded: f64, sample: &RawSample) -> f64 {
        if sample.total > 0 {
            encoded.min(sample.total as f64)
        } else {
            encoded
        }
    }
}

fn reports_no_progress(sample: &RawSample) -> bool {
    sample.total == 0 || (sample.encoded == 0 && sample.percentage <= 0.0)
}
