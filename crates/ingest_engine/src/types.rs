use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::Deserialize;
use thiserror::Error;

/// Status per job identifier from one successful query.
pub type StatusBatch = BTreeMap<String, JobStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedState {
    Waiting,
    Processing,
    Completed,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One job's status as reported by the server, with absent fields defaulted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobStatus {
    pub total: u64,
    pub encoded: u64,
    pub percentage: f64,
    pub state: ReportedState,
    pub in_progress: bool,
    pub complete: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PollTick,
    AnimationTick {
        at: Instant,
    },
    StatusSampled {
        result: Result<StatusBatch, SampleError>,
        observed_at: Instant,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SampleError {
    pub kind: FailureKind,
    pub message: String,
}

impl SampleError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MalformedBody,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MalformedBody => write!(f, "malformed status body"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}
