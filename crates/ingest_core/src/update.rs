use ingest_logging::{ingest_info, ingest_warn};

use crate::{Effect, JobState, Msg, SessionState, TrackerState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    if state.session() == SessionState::Closed && msg != Msg::SessionOpened {
        return (state, Vec::new());
    }

    let phase_before = state.poll_phase();
    let version_before = state.store().version();

    let effects = match msg {
        Msg::SessionOpened => {
            if state.session() == SessionState::Open {
                return (state, Vec::new());
            }
            ingest_info!("session opened");
            state.set_session(SessionState::Open);
            let interval = state.config().animation_interval;
            let mut effects = vec![Effect::StartAnimation { interval }];
            effects.extend(reconcile(&mut state));
            effects
        }
        Msg::SessionClosed => {
            let was_open = state.session() == SessionState::Open;
            state.set_session(SessionState::Closed);
            if was_open {
                ingest_info!("session closed");
                let (_, scheduler, ..) = state.parts_mut();
                let mut effects = scheduler.halt();
                effects.push(Effect::StopAnimation);
                effects
            } else {
                Vec::new()
            }
        }
        Msg::JobRegistered(job_id) => {
            let job_id = job_id.trim();
            let (store, ..) = state.parts_mut();
            if job_id.is_empty() || !store.add_job(job_id) {
                return (state, Vec::new());
            }
            ingest_info!("job registered: {}", job_id);
            reconcile(&mut state)
        }
        Msg::JobUnregistered(job_id) => {
            let job_id = job_id.trim();
            let (store, ..) = state.parts_mut();
            if !store.remove_job(job_id) {
                return (state, Vec::new());
            }
            ingest_info!("job unregistered: {}", job_id);
            reconcile(&mut state)
        }
        Msg::PollTick => {
            if state.session() != SessionState::Open {
                return (state, Vec::new());
            }
            let (store, scheduler, ..) = state.parts_mut();
            scheduler.on_tick(store.job_ids(), store.has_pending())
        }
        Msg::StatusSampled {
            samples,
            observed_at,
        } => {
            let (store, scheduler, estimator, interpolator, _) = state.parts_mut();
            for (job_id, sample) in &samples {
                let newly_failed = sample.state == JobState::Error
                    && store
                        .raw_samples()
                        .get(job_id)
                        .is_some_and(|previous| previous.state != JobState::Error);
                if newly_failed {
                    ingest_warn!(
                        "job {} failed: {}",
                        job_id,
                        sample.error.as_deref().unwrap_or("no error message")
                    );
                }
            }
            store.commit_poll(samples, observed_at, estimator, interpolator);
            scheduler.on_sample_finished(store.has_pending())
        }
        Msg::SampleFailed { reason } => {
            ingest_warn!("status query failed: {}", reason);
            state.record_poll_failure();
            let (store, scheduler, ..) = state.parts_mut();
            scheduler.on_sample_finished(store.has_pending())
        }
        Msg::AnimationTick { now } => {
            if state.session() != SessionState::Open {
                return (state, Vec::new());
            }
            let (store, _, _, interpolator, _) = state.parts_mut();
            store.commit_animation(now, interpolator);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    if state.poll_phase() != phase_before || state.store().version() != version_before {
        state.mark_dirty();
    }

    (state, effects)
}

// Polling effects only apply to an open session; before that the store is
// seeded but no timer runs.
fn reconcile(state: &mut TrackerState) -> Vec<Effect> {
    if state.session() != SessionState::Open {
        return Vec::new();
    }
    let (store, scheduler, _, _, config) = state.parts_mut();
    scheduler.reconcile(store.job_ids(), store.has_pending(), config.poll_interval)
}
