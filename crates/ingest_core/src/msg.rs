use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The owning session became active.
    SessionOpened,
    /// The owning session is being torn down.
    SessionClosed,
    /// A job was enabled by the registration collaborator.
    JobRegistered(crate::JobId),
    /// A job was disabled or removed.
    JobUnregistered(crate::JobId),
    /// Poll timer fired.
    PollTick,
    /// A status query succeeded.
    StatusSampled {
        samples: BTreeMap<crate::JobId, crate::RawSample>,
        observed_at: Instant,
    },
    /// A status query failed in transport; job state is untouched.
    SampleFailed { reason: String },
    /// Animation timer fired.
    AnimationTick { now: Instant },
    /// Fallback for placeholder wiring.
    NoOp,
}
