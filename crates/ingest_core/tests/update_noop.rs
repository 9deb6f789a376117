use ingest_core::{update, Msg, TrackerState};

#[test]
fn update_is_noop() {
    let state = TrackerState::new(Default::default());
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn ticks_before_session_opens_do_nothing() {
    let state = TrackerState::default();
    let (next, effects) = update(state.clone(), Msg::PollTick);
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(
        next,
        Msg::AnimationTick {
            now: std::time::Instant::now(),
        },
    );
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
