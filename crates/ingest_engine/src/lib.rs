//! Ingest engine: status sampling and timer execution.
mod engine;
mod sampler;
mod types;
mod wire;

pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use sampler::{ReqwestSampler, SamplerSettings, StatusSampler};
pub use types::{
    EngineError, EngineEvent, FailureKind, JobStatus, ReportedState, SampleError, StatusBatch,
};
pub use wire::{encode_request, parse_status_body};
