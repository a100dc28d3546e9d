//! Observability: translation telemetry (metrics) and sink abstractions.
//!
//! Translation logic never touches counters directly; every event flows
//! through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

#[cfg(test)]
mod tests;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{
    MetricsEvent, MetricsSink, StageKind, metrics_report, metrics_reset_all, with_metrics_sink,
};
