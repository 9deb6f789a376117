use std::time::Instant;

use crate::view_model::{JobRowView, TrackerViewModel};
use crate::{
    Interpolator, PollPhase, PollScheduler, ProgressStore, TrackerConfig, VelocityEstimator,
};

/// Opaque job key; in practice the address of the backend being indexed.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Unknown,
    Waiting,
    Processing,
    Completed,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }
}

/// Status of one job exactly as the server last reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub total: u64,
    pub encoded: u64,
    pub percentage: f64,
    pub state: JobState,
    pub in_progress: bool,
    pub error: Option<String>,
}

impl RawSample {
    /// Placeholder shown between registration and the first poll response.
    pub fn seed() -> Self {
        Self {
            total: 0,
            encoded: 0,
            percentage: 0.0,
            state: JobState::Waiting,
            in_progress: false,
            error: None,
        }
    }

    /// Builds a sample from server-reported values, clamping them into range.
    ///
    /// `encoded` is capped at `total` and `percentage` is kept within
    /// `0..=100`; a non-finite percentage is read as zero. A report flagged
    /// `complete` is treated as completed unless it carries an error state.
    pub fn reported(
        total: u64,
        encoded: u64,
        percentage: f64,
        state: JobState,
        in_progress: bool,
        complete: bool,
        error: Option<String>,
    ) -> Self {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let state = if complete && state != JobState::Error {
            JobState::Completed
        } else {
            state
        };
        Self {
            total,
            encoded: encoded.min(total),
            percentage,
            state,
            in_progress,
            error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// True when the server says work is actively advancing.
    pub fn is_advancing(&self) -> bool {
        self.state == JobState::Processing && self.in_progress
    }
}

/// Processing-rate estimate for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityRecord {
    /// Units per second, never negative.
    pub velocity: f64,
    pub last_observed_encoded: f64,
    pub last_observed_at: Instant,
}

/// Smoothed progress shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplayRecord {
    pub display_encoded: f64,
    pub display_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    config: TrackerConfig,
    session: SessionState,
    store: ProgressStore,
    scheduler: PollScheduler,
    estimator: VelocityEstimator,
    interpolator: Interpolator,
    poll_failures: u64,
    dirty: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl TrackerState {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            estimator: VelocityEstimator::new(config.default_velocity),
            interpolator: Interpolator::new(config.percentage_cap),
            config,
            session: SessionState::Idle,
            store: ProgressStore::new(),
            scheduler: PollScheduler::default(),
            poll_failures: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn poll_phase(&self) -> PollPhase {
        self.scheduler.phase()
    }

    pub fn polls_issued(&self) -> u64 {
        self.scheduler.polls_issued()
    }

    pub fn view(&self) -> TrackerViewModel {
        let snapshot = self.store.snapshot();
        let jobs: Vec<JobRowView> = snapshot
            .raw_samples()
            .iter()
            .map(|(job_id, sample)| {
                let display = snapshot
                    .display_records()
                    .get(job_id)
                    .copied()
                    .unwrap_or_default();
                JobRowView {
                    job_id: job_id.clone(),
                    state: sample.state,
                    total: sample.total,
                    display_encoded: display.display_encoded,
                    display_percentage: display.display_percentage,
                    velocity: snapshot
                        .velocities()
                        .get(job_id)
                        .map(|record| record.velocity)
                        .filter(|velocity| *velocity > 0.0),
                    error: sample.error.clone(),
                }
            })
            .collect();

        TrackerViewModel {
            session: self.session,
            poll_phase: self.scheduler.phase(),
            version: snapshot.version(),
            job_count: jobs.len(),
            terminal_count: jobs.iter().filter(|job| job.state.is_terminal()).count(),
            polls_issued: self.scheduler.polls_issued(),
            poll_failures: self.poll_failures,
            jobs,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.dirty = true;
    }

    pub(crate) fn record_poll_failure(&mut self) {
        self.poll_failures += 1;
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut ProgressStore,
        &mut PollScheduler,
        &VelocityEstimator,
        &Interpolator,
        &TrackerConfig,
    ) {
        (
            &mut self.store,
            &mut self.scheduler,
            &self.estimator,
            &self.interpolator,
            &self.config,
        )
    }
}
