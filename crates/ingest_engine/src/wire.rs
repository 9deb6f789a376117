//! JSON wire format of the status endpoint.
//!
//! Request: `{"backends": ["<id>", ...]}`.
//! Response: an object keyed by identifier, each value carrying
//! `total`, `encoded`, `percentage`, `state`, `in_progress`, `complete` and
//! `error`. Any field may be missing or `null`; identifiers the server does
//! not know are simply absent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{FailureKind, JobStatus, ReportedState, SampleError, StatusBatch};

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    backends: &'a [String],
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    encoded: Option<u64>,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    state: Option<ReportedState>,
    #[serde(default)]
    in_progress: Option<bool>,
    #[serde(default)]
    complete: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl From<WireStatus> for JobStatus {
    fn from(wire: WireStatus) -> Self {
        Self {
            total: wire.total.unwrap_or(0),
            encoded: wire.encoded.unwrap_or(0),
            percentage: wire.percentage.unwrap_or(0.0),
            state: wire.state.unwrap_or_default(),
            in_progress: wire.in_progress.unwrap_or(false),
            complete: wire.complete.unwrap_or(false),
            error: wire.error.filter(|message| !message.is_empty()),
        }
    }
}

pub fn encode_request(job_ids: &[String]) -> Result<Vec<u8>, SampleError> {
    serde_json::to_vec(&StatusRequest { backends: job_ids })
        .map_err(|err| SampleError::new(FailureKind::MalformedBody, err.to_string()))
}

/// Parses a status response body. Entries whose value is `null` are skipped.
pub fn parse_status_body(body: &[u8]) -> Result<StatusBatch, SampleError> {
    let raw: HashMap<String, Option<WireStatus>> = serde_json::from_slice(body)
        .map_err(|err| SampleError::new(FailureKind::MalformedBody, err.to_string()))?;
    Ok(raw
        .into_iter()
        .filter_map(|(id, status)| status.map(|status| (id, JobStatus::from(status))))
        .collect())
}
