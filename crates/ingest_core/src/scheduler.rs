use std::time::Duration;

use ingest_logging::{ingest_debug, ingest_info};

use crate::{Effect, JobId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
}

/// Decides when status queries are issued.
///
/// Polling runs only while at least one enabled job is non-terminal. At most
/// one query is outstanding; ticks that arrive while one is in flight are
/// skipped. A failed query leaves the scheduler polling so the next tick
/// retries it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollScheduler {
    phase: PollPhase,
    in_flight: bool,
    polls_issued: u64,
}

impl PollScheduler {
    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn polls_issued(&self) -> u64 {
        self.polls_issued
    }

    /// Re-evaluates after the enabled set changed or the session opened.
    ///
    /// Leaving `Idle` starts the timer and queries immediately, so a job added
    /// after everything else settled is picked up without waiting a full
    /// interval.
    pub fn reconcile(
        &mut self,
        job_ids: Vec<JobId>,
        has_pending: bool,
        interval: Duration,
    ) -> Vec<Effect> {
        match (self.phase, has_pending) {
            (PollPhase::Idle, true) => {
                ingest_info!("polling started for {} job(s)", job_ids.len());
                self.phase = PollPhase::Polling;
                let mut effects = vec![Effect::StartPolling { interval }];
                effects.extend(self.request(job_ids));
                effects
            }
            (PollPhase::Polling, false) => self.stop(),
            _ => Vec::new(),
        }
    }

    pub fn on_tick(&mut self, job_ids: Vec<JobId>, has_pending: bool) -> Vec<Effect> {
        if self.phase == PollPhase::Idle {
            return Vec::new();
        }
        if !has_pending {
            return self.stop();
        }
        if self.in_flight {
            ingest_debug!("poll tick skipped, previous status query still in flight");
            return Vec::new();
        }
        self.request(job_ids).into_iter().collect()
    }

    /// Called once the outstanding query produced a result or failed and the
    /// outcome has been committed.
    pub fn on_sample_finished(&mut self, has_pending: bool) -> Vec<Effect> {
        self.in_flight = false;
        if self.phase == PollPhase::Polling && !has_pending {
            return self.stop();
        }
        Vec::new()
    }

    /// Stops polling unconditionally, for session teardown.
    pub fn halt(&mut self) -> Vec<Effect> {
        self.in_flight = false;
        match self.phase {
            PollPhase::Polling => self.stop(),
            PollPhase::Idle => Vec::new(),
        }
    }

    fn request(&mut self, job_ids: Vec<JobId>) -> Option<Effect> {
        if self.in_flight || job_ids.is_empty() {
            return None;
        }
        self.in_flight = true;
        self.polls_issued += 1;
        Some(Effect::RequestStatus { job_ids })
    }

    fn stop(&mut self) -> Vec<Effect> {
        ingest_info!("polling stopped after {} request(s)", self.polls_issued);
        self.phase = PollPhase::Idle;
        vec![Effect::StopPolling]
    }
}
