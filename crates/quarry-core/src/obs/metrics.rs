use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for translation activity on this thread.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) rejected: BTreeMap<String, u64>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Translator entrypoints
    pub translations: u64,
    pub translations_failed: u64,

    // Stages produced
    pub match_stages: u64,
    pub project_stages: u64,

    // Operator rejections
    pub rejected_operators: u64,

    // Analysis passes
    pub nominations: u64,
    pub candidates_nominated: u64,
    pub substitutions: u64,
    pub substitutions_applied: u64,
}

///
/// EventReport
/// Point-in-time snapshot of the counters.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub rejected: BTreeMap<String, u64>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Snapshot current counters.
pub(crate) fn report() -> EventReport {
    EVENT_STATE.with(|m| {
        let state = m.borrow();

        EventReport {
            ops: state.ops.clone(),
            rejected: state.rejected.clone(),
        }
    })
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}
