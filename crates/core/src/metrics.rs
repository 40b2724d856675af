//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Probes emitted per kind
//! - Series skipped per reason
//! - Escalation transitions and rerun requests

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

/// Probes emitted by kind.
pub static PROBES_EMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("emitter_probes_emitted_total", "Total probes emitted"),
        &["kind"], // "primary", "gap_fill"
    )
    .unwrap()
});

/// Series skipped during a run by reason.
pub static SERIES_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "emitter_series_skipped_total",
            "Series that produced no probes",
        ),
        &["reason"], // "unsupported", "no_history"
    )
    .unwrap()
});

/// Escalation state changes by target state.
pub static ESCALATION_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "emitter_escalation_transitions_total",
            "Escalation state transitions",
        ),
        &["to"], // "normal", "probing_next_season", "given_up"
    )
    .unwrap()
});

/// Reruns requested by completion reports.
pub static RERUNS_REQUESTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "emitter_reruns_requested_total",
        "Reruns requested after search results",
    )
    .unwrap()
});

/// All core metrics, for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PROBES_EMITTED.clone()),
        Box::new(SERIES_SKIPPED.clone()),
        Box::new(ESCALATION_TRANSITIONS.clone()),
        Box::new(RERUNS_REQUESTED.clone()),
    ]
}
