use std::sync::{mpsc, Arc};

use ingest_core::{Effect, JobState, Msg, RawSample};
use ingest_engine::{
    EngineError, EngineEvent, EngineHandle, EventSink, JobStatus, ReportedState, ReqwestSampler,
    SamplerSettings,
};
use ingest_logging::{ingest_debug, ingest_info};

/// Executes core effects against the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: SamplerSettings, msg_tx: mpsc::Sender<Msg>) -> Result<Self, EngineError> {
        ingest_info!("sampling status from {}", settings.status_url);
        let sampler = Arc::new(ReqwestSampler::new(settings)?);
        let engine = EngineHandle::new(sampler, Arc::new(MsgSink { msg_tx }))?;
        Ok(Self { engine })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling { interval } => {
                    ingest_info!("StartPolling interval={:?}", interval);
                    self.engine.start_polling(interval);
                }
                Effect::StopPolling => {
                    ingest_info!("StopPolling");
                    self.engine.stop_polling();
                }
                Effect::RequestStatus { job_ids } => {
                    ingest_logging::set_poll_cycle(ingest_logging::poll_cycle() + 1);
                    ingest_debug!("RequestStatus jobs={:?}", job_ids);
                    self.engine.sample(job_ids);
                }
                Effect::StartAnimation { interval } => {
                    ingest_debug!("StartAnimation interval={:?}", interval);
                    self.engine.start_animation(interval);
                }
                Effect::StopAnimation => self.engine.stop_animation(),
            }
        }
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

struct MsgSink {
    msg_tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.msg_tx.send(to_msg(event));
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PollTick => Msg::PollTick,
        EngineEvent::AnimationTick { at } => Msg::AnimationTick { now: at },
        EngineEvent::StatusSampled {
            result: Ok(batch),
            observed_at,
        } => Msg::StatusSampled {
            samples: batch
                .into_iter()
                .map(|(job_id, status)| (job_id, map_status(status)))
                .collect(),
            observed_at,
        },
        EngineEvent::StatusSampled { result: Err(err), .. } => Msg::SampleFailed {
            reason: err.to_string(),
        },
    }
}

fn map_status(status: JobStatus) -> RawSample {
    RawSample::reported(
        status.total,
        status.encoded,
        status.percentage,
        map_state(status.state),
        status.in_progress,
        status.complete,
        status.error,
    )
}

fn map_state(state: ReportedState) -> JobState {
    match state {
        ReportedState::Unknown => JobState::Unknown,
        ReportedState::Waiting => JobState::Waiting,
        ReportedState::Processing => JobState::Processing,
        ReportedState::Completed => JobState::Completed,
        ReportedState::Error => JobState::Error,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Instant;

    use ingest_engine::{FailureKind, SampleError};

    use super::*;

    #[test]
    fn sampled_statuses_become_clamped_raw_samples() {
        let observed_at = Instant::now();
        let batch = BTreeMap::from([(
            "http://a".to_string(),
            JobStatus {
                total: 10,
                encoded: 12,
                percentage: 100.0,
                state: ReportedState::Processing,
                in_progress: false,
                complete: true,
                error: None,
            },
        )]);

        let msg = to_msg(EngineEvent::StatusSampled {
            result: Ok(batch),
            observed_at,
        });

        let (samples, at) = match msg {
            Msg::StatusSampled {
                samples,
                observed_at,
            } => (samples, observed_at),
            other => panic!("expected StatusSampled, got {other:?}"),
        };
        assert_eq!(at, observed_at);
        assert_eq!(samples["http://a"].encoded, 10);
        assert_eq!(samples["http://a"].state, JobState::Completed);
    }

    #[test]
    fn transport_errors_become_sample_failures() {
        let msg = to_msg(EngineEvent::StatusSampled {
            result: Err(SampleError {
                kind: FailureKind::HttpStatus(502),
                message: "502 Bad Gateway".to_string(),
            }),
            observed_at: Instant::now(),
        });
        assert_eq!(
            msg,
            Msg::SampleFailed {
                reason: "http status 502: 502 Bad Gateway".to_string()
            }
        );
    }

    #[test]
    fn ticks_map_one_to_one() {
        let at = Instant::now();
        assert_eq!(to_msg(EngineEvent::PollTick), Msg::PollTick);
        assert_eq!(
            to_msg(EngineEvent::AnimationTick { at }),
            Msg::AnimationTick { now: at }
        );
    }
}
