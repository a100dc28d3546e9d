use super::*;
use crate::{config::ExecutionTarget, expr::SequenceOperator};
use std::{cell::RefCell, rc::Rc};

#[derive(Default)]
struct CaptureSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CaptureSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[test]
fn global_sink_accumulates_counters() {
    metrics_reset_all();

    sink::record(MetricsEvent::TranslateStart {
        target: ExecutionTarget::Query,
    });
    sink::record(MetricsEvent::StageBuilt {
        kind: StageKind::Match,
    });
    sink::record(MetricsEvent::Rejected {
        operator: SequenceOperator::Intersect,
    });
    sink::record(MetricsEvent::Nominated { candidates: 3 });
    sink::record(MetricsEvent::Substituted { changed: false });
    sink::record(MetricsEvent::TranslateFinish {
        stages: 1,
        failed: true,
    });

    let report = metrics_report();
    assert_eq!(report.ops.translations, 1);
    assert_eq!(report.ops.translations_failed, 1);
    assert_eq!(report.ops.match_stages, 1);
    assert_eq!(report.ops.candidates_nominated, 3);
    assert_eq!(report.ops.substitutions, 1);
    assert_eq!(report.ops.substitutions_applied, 0);
    assert_eq!(report.rejected.get("Intersect"), Some(&1));

    metrics_reset_all();
    assert_eq!(metrics_report(), EventReport::default());
}

#[test]
fn scoped_sink_override_captures_and_restores() {
    metrics_reset_all();
    let capture = Rc::new(CaptureSink::default());

    with_metrics_sink(capture.clone(), || {
        sink::record(MetricsEvent::Nominated { candidates: 2 });
    });
    sink::record(MetricsEvent::Nominated { candidates: 5 });

    assert_eq!(
        capture.events.borrow().as_slice(),
        &[MetricsEvent::Nominated { candidates: 2 }]
    );
    assert_eq!(metrics_report().ops.candidates_nominated, 5);
}
