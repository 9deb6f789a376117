use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start (or restart) the periodic poll timer.
    StartPolling { interval: Duration },
    StopPolling,
    /// Issue one status query for these jobs.
    RequestStatus { job_ids: Vec<crate::JobId> },
    StartAnimation { interval: Duration },
    StopAnimation,
}
