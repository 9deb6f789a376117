//! Ingest core: pure job-progress state machine and view-model helpers.
mod config;
mod effect;
mod interpolate;
mod msg;
mod scheduler;
mod state;
mod store;
mod update;
mod velocity;
mod view_model;

pub use config::{
    ConfigError, TrackerConfig, DEFAULT_ANIMATION_INTERVAL, DEFAULT_POLL_INTERVAL,
    DEFAULT_VELOCITY, DISPLAY_PERCENTAGE_CAP, LEGACY_POLL_INTERVAL,
};
pub use effect::Effect;
pub use interpolate::Interpolator;
pub use msg::Msg;
pub use scheduler::{PollPhase, PollScheduler};
pub use state::{
    DisplayRecord, JobId, JobState, RawSample, SessionState, TrackerState, VelocityRecord,
};
pub use store::{ProgressStore, StoreSnapshot};
pub use update::update;
pub use velocity::VelocityEstimator;
pub use view_model::{JobRowView, TrackerViewModel};
