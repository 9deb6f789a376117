use crate::{JobId, JobState, PollPhase, SessionState};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerViewModel {
    pub session: SessionState,
    pub poll_phase: PollPhase,
    pub version: u64,
    pub job_count: usize,
    pub terminal_count: usize,
    pub polls_issued: u64,
    pub poll_failures: u64,
    pub jobs: Vec<JobRowView>,
    pub dirty: bool,
}

impl TrackerViewModel {
    pub fn job(&self, job_id: &str) -> Option<&JobRowView> {
        self.jobs.iter().find(|job| job.job_id == job_id)
    }

    /// True once there are jobs and every one of them is terminal.
    pub fn all_settled(&self) -> bool {
        self.job_count > 0 && self.terminal_count == self.job_count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub state: JobState,
    pub total: u64,
    pub display_encoded: f64,
    pub display_percentage: f64,
    /// Present only while the job is animating.
    pub velocity: Option<f64>,
    pub error: Option<String>,
}
