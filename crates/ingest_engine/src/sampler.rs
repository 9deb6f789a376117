use std::time::Duration;

use futures_util::StreamExt;
use ingest_logging::ingest_debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::wire::{encode_request, parse_status_body};
use crate::{EngineError, FailureKind, SampleError, StatusBatch};

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub status_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
}

impl SamplerSettings {
    pub fn new(status_url: impl Into<String>) -> Self {
        Self {
            status_url: status_url.into(),
            ..Self::default()
        }
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            status_url: "http://127.0.0.1:8080/embedding/status".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// One status round trip for a set of jobs.
///
/// Implementations report every transport problem as a [`SampleError`] and
/// never retry; the poll timer calling again is the retry.
#[async_trait::async_trait]
pub trait StatusSampler: Send + Sync {
    async fn sample(&self, job_ids: &[String]) -> Result<StatusBatch, SampleError>;
}

/// Posts status queries over one pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestSampler {
    settings: SamplerSettings,
    client: reqwest::Client,
}

impl ReqwestSampler {
    pub fn new(settings: SamplerSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(EngineError::Client)?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    fn too_large(&self, actual: u64) -> SampleError {
        SampleError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_body_bytes,
                actual: Some(actual),
            },
            "status body too large",
        )
    }
}

#[async_trait::async_trait]
impl StatusSampler for ReqwestSampler {
    async fn sample(&self, job_ids: &[String]) -> Result<StatusBatch, SampleError> {
        if job_ids.is_empty() {
            return Ok(StatusBatch::new());
        }

        let url = reqwest::Url::parse(&self.settings.status_url)
            .map_err(|err| SampleError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let body = encode_request(job_ids)?;

        ingest_debug!("querying status of {} job(s) at {}", job_ids.len(), url);
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SampleError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_body_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_body_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let batch = parse_status_body(&bytes)?;
        ingest_debug!(
            "status query returned {} of {} job(s)",
            batch.len(),
            job_ids.len()
        );
        Ok(batch)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SampleError {
    if err.is_timeout() {
        return SampleError::new(FailureKind::Timeout, err.to_string());
    }
    SampleError::new(FailureKind::Network, err.to_string())
}
