use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    DisplayRecord, Interpolator, JobId, JobState, RawSample, VelocityEstimator, VelocityRecord,
};

/// Immutable view of every tracked job at one store version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    version: u64,
    raw_samples: BTreeMap<JobId, RawSample>,
    velocities: BTreeMap<JobId, VelocityRecord>,
    display_records: BTreeMap<JobId, DisplayRecord>,
}

impl StoreSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn raw_samples(&self) -> &BTreeMap<JobId, RawSample> {
        &self.raw_samples
    }

    pub fn velocities(&self) -> &BTreeMap<JobId, VelocityRecord> {
        &self.velocities
    }

    pub fn display_records(&self) -> &BTreeMap<JobId, DisplayRecord> {
        &self.display_records
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.raw_samples.contains_key(job_id)
    }
}

/// Versioned job state. Every commit builds a new snapshot and swaps it in
/// whole, so a reader holding an `Arc<StoreSnapshot>` never sees a partial
/// update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressStore {
    current: Arc<StoreSnapshot>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.current)
    }

    pub fn version(&self) -> u64 {
        self.current.version
    }

    pub fn raw_samples(&self) -> &BTreeMap<JobId, RawSample> {
        &self.current.raw_samples
    }

    pub fn velocities(&self) -> &BTreeMap<JobId, VelocityRecord> {
        &self.current.velocities
    }

    pub fn display_records(&self) -> &BTreeMap<JobId, DisplayRecord> {
        &self.current.display_records
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.current.contains(job_id)
    }

    /// Identifiers of every tracked job, ascending.
    pub fn job_ids(&self) -> Vec<JobId> {
        self.current.raw_samples.keys().cloned().collect()
    }

    /// True while at least one tracked job has not reached a terminal state.
    pub fn has_pending(&self) -> bool {
        self.current
            .raw_samples
            .values()
            .any(|sample| !sample.is_terminal())
    }

    /// Seeds a newly enabled job as waiting. Returns false if it is already tracked.
    pub fn add_job(&mut self, job_id: &str) -> bool {
        if self.contains(job_id) {
            return false;
        }
        let mut next = (*self.current).clone();
        next.raw_samples.insert(job_id.to_owned(), RawSample::seed());
        next.display_records
            .insert(job_id.to_owned(), DisplayRecord::default());
        self.publish(next);
        true
    }

    /// Drops a job from all three maps at once. Returns false if it was not tracked.
    pub fn remove_job(&mut self, job_id: &str) -> bool {
        if !self.contains(job_id) {
            return false;
        }
        let mut next = (*self.current).clone();
        next.raw_samples.remove(job_id);
        next.velocities.remove(job_id);
        next.display_records.remove(job_id);
        self.publish(next);
        true
    }

    /// Commits one poll response. Samples for untracked jobs are dropped and
    /// tracked jobs missing from `samples` keep their previous state.
    ///
    /// Returns the identifiers of jobs whose sample was replaced.
    pub fn commit_poll(
        &mut self,
        samples: BTreeMap<JobId, RawSample>,
        observed_at: Instant,
        estimator: &VelocityEstimator,
        interpolator: &Interpolator,
    ) -> Vec<JobId> {
        let mut next = (*self.current).clone();
        let mut applied = Vec::new();

        for (job_id, sample) in samples {
            if !next.raw_samples.contains_key(&job_id) {
                continue;
            }

            if sample.state == JobState::Processing {
                let record = estimator.estimate(next.velocities.get(&job_id), &sample, observed_at);
                next.velocities.insert(job_id.clone(), record);
            } else {
                next.velocities.remove(&job_id);
            }

            let display = interpolator.settle(
                &sample,
                next.raw_samples.get(&job_id),
                next.display_records.get(&job_id),
            );
            next.display_records.insert(job_id.clone(), display);
            next.raw_samples.insert(job_id.clone(), sample);
            applied.push(job_id);
        }

        if !applied.is_empty() {
            self.publish(next);
        }
        applied
    }

    /// Advances display records of processing jobs to `now`. Publishes a new
    /// snapshot only if some job moved; returns whether one was published.
    pub fn commit_animation(&mut self, now: Instant, interpolator: &Interpolator) -> bool {
        let current = &self.current;
        let advanced: Vec<(JobId, DisplayRecord)> = current
            .velocities
            .iter()
            .filter_map(|(job_id, velocity)| {
                let sample = current.raw_samples.get(job_id)?;
                let display = current.display_records.get(job_id);
                interpolator
                    .predict(sample, velocity, display, now)
                    .map(|record| (job_id.clone(), record))
            })
            .collect();

        if advanced.is_empty() {
            return false;
        }

        let mut next = (**current).clone();
        next.display_records.extend(advanced);
        self.publish(next);
        true
    }

    fn publish(&mut self, mut next: StoreSnapshot) {
        next.version = self.current.version + 1;
        self.current = Arc::new(next);
    }
}
