use std::collections::BTreeMap;
use std::sync::Once;
use std::time::{Duration, Instant};

use ingest_core::{update, Effect, JobState, Msg, PollPhase, RawSample, TrackerState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ingest_logging::initialize_for_tests);
}

fn register(ids: &[&str]) -> TrackerState {
    let (mut state, _) = update(TrackerState::default(), Msg::SessionOpened);
    for id in ids {
        let (next, _) = update(state, Msg::JobRegistered(id.to_string()));
        state = next;
    }
    state
}

fn poll(
    state: TrackerState,
    entries: Vec<(&str, RawSample)>,
    at: Instant,
) -> (TrackerState, Vec<Effect>) {
    let (state, _) = update(state, Msg::PollTick);
    let samples = entries
        .into_iter()
        .map(|(id, sample)| (id.to_string(), sample))
        .collect::<BTreeMap<_, _>>();
    update(
        state,
        Msg::StatusSampled {
            samples,
            observed_at: at,
        },
    )
}

fn tick(state: TrackerState, now: Instant) -> TrackerState {
    update(state, Msg::AnimationTick { now }).0
}

fn processing(total: u64, encoded: u64) -> RawSample {
    let percentage = encoded as f64 / total as f64 * 100.0;
    RawSample::reported(total, encoded, percentage, JobState::Processing, true, false, None)
}

fn percentage(state: &TrackerState, id: &str) -> f64 {
    state.view().job(id).expect("job row").display_percentage
}

fn encoded(state: &TrackerState, id: &str) -> f64 {
    state.view().job(id).expect("job row").display_encoded
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn single_job_waits_animates_and_completes() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A"]);

    // Poll #1: waiting, nothing to extrapolate.
    let waiting = RawSample::reported(10, 0, 0.0, JobState::Waiting, false, false, None);
    let (state, _) = poll(state, vec![("A", waiting)], t0);
    let state = tick(state, t0 + Duration::from_secs(2));
    assert_eq!(percentage(&state, "A"), 0.0);
    assert!(state.store().velocities().get("A").is_none());

    // Poll #2: processing, velocity seeded with the default.
    let t1 = t0 + Duration::from_secs(5);
    let (state, _) = poll(state, vec![("A", processing(10, 5))], t1);
    assert_eq!(state.store().velocities()["A"].velocity, 1.5);
    assert_eq!(encoded(&state, "A"), 5.0);

    let state = tick(state, t1 + Duration::from_secs(1));
    assert!(approx(encoded(&state, "A"), 6.5));
    assert!(approx(percentage(&state, "A"), 65.0));

    let mut state = state;
    let mut last = percentage(&state, "A");
    for step in 2..40 {
        state = tick(state, t1 + Duration::from_millis(333 * step));
        let current = percentage(&state, "A");
        assert!(current >= last);
        assert!(encoded(&state, "A") <= 10.0);
        assert!(current <= 99.9);
        last = current;
    }
    assert_eq!(encoded(&state, "A"), 10.0);
    assert_eq!(percentage(&state, "A"), 99.9);

    // Poll #3: completed snaps to 100 and polling stops.
    let done = RawSample::reported(10, 10, 100.0, JobState::Completed, false, true, None);
    let (state, effects) = poll(state, vec![("A", done)], t1 + Duration::from_secs(20));
    assert_eq!(percentage(&state, "A"), 100.0);
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.poll_phase(), PollPhase::Idle);
    assert!(state.view().all_settled());
}

#[test]
fn concurrent_jobs_have_independent_velocities() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A", "B"]);

    let (state, _) = poll(
        state,
        vec![("A", processing(100, 0)), ("B", processing(100, 0))],
        t0,
    );
    let t1 = t0 + Duration::from_secs(5);
    let (state, _) = poll(
        state,
        vec![("A", processing(100, 10)), ("B", processing(100, 40))],
        t1,
    );
    assert!(approx(state.store().velocities()["A"].velocity, 2.0));
    assert!(approx(state.store().velocities()["B"].velocity, 8.0));

    let state = tick(state, t1 + Duration::from_secs(1));
    assert!(approx(encoded(&state, "A"), 12.0));
    assert!(approx(encoded(&state, "B"), 48.0));

    // Only A reports; B keeps its sample and its own rate.
    let t2 = t1 + Duration::from_secs(5);
    let (state, _) = poll(state, vec![("A", processing(100, 20))], t2);
    assert_eq!(state.store().raw_samples()["B"].encoded, 40);
    assert!(approx(state.store().velocities()["B"].velocity, 8.0));
    assert!(approx(state.store().velocities()["A"].velocity, 2.0));

    let state = tick(state, t2 + Duration::from_secs(1));
    assert!(approx(encoded(&state, "A"), 22.0));
    assert!(approx(encoded(&state, "B"), 88.0));
}

#[test]
fn job_error_shows_last_reported_percentage_and_stops_animating() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A"]);
    let (state, _) = poll(state, vec![("A", processing(10, 3))], t0);
    let state = tick(state, t0 + Duration::from_secs(2));
    assert!(approx(percentage(&state, "A"), 60.0));

    let failed = RawSample::reported(
        10,
        3,
        30.0,
        JobState::Error,
        false,
        false,
        Some("disk full".to_string()),
    );
    let (state, effects) = poll(state, vec![("A", failed)], t0 + Duration::from_secs(5));
    assert_eq!(effects, vec![Effect::StopPolling]);

    // The extrapolated 60% is replaced by the server's last report.
    let row = state.view().job("A").cloned().expect("row");
    assert_eq!(row.state, JobState::Error);
    assert_eq!(row.error.as_deref(), Some("disk full"));
    assert!(approx(row.display_percentage, 30.0));
    assert!(approx(row.display_encoded, 3.0));
    assert_eq!(row.velocity, None);
    assert!(state.store().velocities().get("A").is_none());

    let version = state.store().version();
    let state = tick(state, t0 + Duration::from_secs(30));
    assert_eq!(state.store().version(), version);
    assert!(approx(percentage(&state, "A"), 30.0));
}

#[test]
fn unregistering_mid_flight_clears_every_map() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A", "B"]);
    let (state, _) = poll(
        state,
        vec![("A", processing(10, 2)), ("B", processing(10, 1))],
        t0,
    );
    let (state, _) = update(state, Msg::PollTick);

    let (state, _) = update(state, Msg::JobUnregistered("A".to_string()));
    let snapshot = state.store().snapshot();
    assert!(!snapshot.raw_samples().contains_key("A"));
    assert!(!snapshot.velocities().contains_key("A"));
    assert!(!snapshot.display_records().contains_key("A"));

    // The in-flight response still mentions A; it must not come back.
    let samples = BTreeMap::from([
        ("A".to_string(), processing(10, 4)),
        ("B".to_string(), processing(10, 3)),
    ]);
    let (state, _) = update(
        state,
        Msg::StatusSampled {
            samples,
            observed_at: t0 + Duration::from_secs(5),
        },
    );
    let snapshot = state.store().snapshot();
    assert!(!snapshot.raw_samples().contains_key("A"));
    assert!(!snapshot.velocities().contains_key("A"));
    assert!(!snapshot.display_records().contains_key("A"));
    assert_eq!(snapshot.raw_samples()["B"].encoded, 3);
}

#[test]
fn display_is_monotonic_across_noisy_samples() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A"]);
    let reports = [10, 8, 8, 30, 29, 60, 61, 95];

    let mut state = state;
    let mut last = 0.0;
    for (cycle, reported) in reports.into_iter().enumerate() {
        let at = t0 + Duration::from_secs(5 * cycle as u64);
        let (next, _) = poll(state, vec![("A", processing(100, reported))], at);
        state = next;
        for step in 0..15 {
            state = tick(state, at + Duration::from_millis(333 * step));
            let current = percentage(&state, "A");
            assert!(current >= last, "regressed from {last} to {current}");
            assert!(current <= 99.9);
            assert!(encoded(&state, "A") <= 100.0);
            last = current;
        }
    }
    assert!(state.store().velocities()["A"].velocity > 0.0);
}

#[test]
fn snapshots_held_by_readers_are_not_mutated() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A"]);
    let (state, _) = poll(state, vec![("A", processing(10, 2))], t0);
    let held = state.store().snapshot();
    let held_version = held.version();

    let state = tick(state, t0 + Duration::from_secs(1));
    assert!(state.store().version() > held_version);
    assert_eq!(held.version(), held_version);
    assert_eq!(held.display_records()["A"].display_encoded, 2.0);
    assert!(approx(state.store().display_records()["A"].display_encoded, 3.5));
}

#[test]
fn idle_animation_ticks_do_not_publish() {
    init_logging();
    let mut state = register(&["A"]);
    assert!(state.consume_dirty());
    let version = state.store().version();

    let mut state = tick(state, Instant::now());
    assert_eq!(state.store().version(), version);
    assert!(!state.consume_dirty());
}

#[test]
fn processing_sample_without_percentage_shows_derived_value() {
    init_logging();
    let t0 = Instant::now();
    let state = register(&["A", "B"]);

    let moving = RawSample::reported(10, 5, 0.0, JobState::Processing, true, false, None);
    let paused = RawSample::reported(10, 5, 0.0, JobState::Processing, false, false, None);
    let (state, _) = poll(state, vec![("A", moving), ("B", paused)], t0);
    assert_eq!(percentage(&state, "A"), 50.0);
    assert_eq!(percentage(&state, "B"), 50.0);

    let state = tick(state, t0 + Duration::from_secs(4));
    assert!(approx(encoded(&state, "A"), 10.0));
    assert_eq!(percentage(&state, "A"), 99.9);
    assert_eq!(encoded(&state, "B"), 5.0);
    assert_eq!(percentage(&state, "B"), 50.0);
}
