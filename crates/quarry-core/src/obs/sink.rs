//! Metrics sink boundary.
//!
//! Translation code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{config::ExecutionTarget, expr::SequenceOperator, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// StageKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageKind {
    Match,
    Project,
}

///
/// MetricsEvent
///
/// Events carry counts and operator names only, never query values.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    TranslateStart {
        target: ExecutionTarget,
    },
    TranslateFinish {
        stages: u64,
        failed: bool,
    },
    StageBuilt {
        kind: StageKind,
    },
    Rejected {
        operator: SequenceOperator,
    },
    Nominated {
        candidates: u64,
    },
    Substituted {
        changed: bool,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::TranslateStart { .. } => {
                m.ops.translations = m.ops.translations.saturating_add(1);
            }
            MetricsEvent::TranslateFinish { failed, .. } => {
                if failed {
                    m.ops.translations_failed = m.ops.translations_failed.saturating_add(1);
                }
            }
            MetricsEvent::StageBuilt { kind } => match kind {
                StageKind::Match => m.ops.match_stages = m.ops.match_stages.saturating_add(1),
                StageKind::Project => {
                    m.ops.project_stages = m.ops.project_stages.saturating_add(1);
                }
            },
            MetricsEvent::Rejected { operator } => {
                m.ops.rejected_operators = m.ops.rejected_operators.saturating_add(1);
                let entry = m.rejected.entry(operator.to_string()).or_default();
                *entry = entry.saturating_add(1);
            }
            MetricsEvent::Nominated { candidates } => {
                m.ops.nominations = m.ops.nominations.saturating_add(1);
                m.ops.candidates_nominated =
                    m.ops.candidates_nominated.saturating_add(candidates);
            }
            MetricsEvent::Substituted { changed } => {
                m.ops.substitutions = m.ops.substitutions.saturating_add(1);
                if changed {
                    m.ops.substitutions_applied = m.ops.substitutions_applied.saturating_add(1);
                }
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match override_sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for test and diagnostics plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
