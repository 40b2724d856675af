//! Per-run escalation state machine.
//!
//! A rejected primary probe is ambiguous: the next episode may simply not be
//! out yet, or the season ended and tracking has to roll over. Each series gets
//! one rollover attempt per run:
//!
//! ```text
//! normal --rejected--> probing_next_season --rejected--> given_up
//!   ^                          |
//!   +--------accepted----------+
//! ```
//!
//! Accepted and first-rejection transitions request a rerun of the whole
//! computation. Rejections leave `given_up` untouched until the next fresh
//! run; an accepted result resets any state to `normal`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::{ESCALATION_TRANSITIONS, RERUNS_REQUESTED};

/// Escalation state of one series within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    #[default]
    Normal,
    ProbingNextSeason,
    GivenUp,
}

impl EscalationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationState::Normal => "normal",
            EscalationState::ProbingNextSeason => "probing_next_season",
            EscalationState::GivenUp => "given_up",
        }
    }
}

/// Escalation state of every series touched in the current run.
///
/// Series not present are `Normal`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RunState {
    series: BTreeMap<String, EscalationState>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, series_name: &str) -> EscalationState {
        self.series
            .get(series_name)
            .copied()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EscalationState)> {
        self.series.iter().map(|(name, state)| (name.as_str(), *state))
    }

    fn set(&mut self, series_name: &str, state: EscalationState) {
        self.series.insert(series_name.to_string(), state);
    }

    fn clear(&mut self) {
        self.series.clear();
    }
}

/// Result of applying a completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: EscalationState,
    pub to: EscalationState,
    /// Whether this report asked the scheduler for a rerun.
    pub rerun: bool,
}

/// Owns the run's `RunState` and the pending rerun signal.
#[derive(Debug, Default)]
pub struct EscalationController {
    state: RunState,
    rerun_requested: bool,
}

impl EscalationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for a new invocation of the computation.
    ///
    /// A fresh run starts from an empty `RunState`; a rerun keeps it. Either
    /// way the previous rerun signal is considered consumed.
    pub fn begin_run(&mut self, is_rerun: bool) {
        if !is_rerun {
            if !self.state.is_empty() {
                debug!("Resetting escalation state for fresh run");
            }
            self.state.clear();
        }
        self.rerun_requested = false;
    }

    pub fn run_state(&self) -> &RunState {
        &self.state
    }

    pub fn state_of(&self, series_name: &str) -> EscalationState {
        self.state.get(series_name)
    }

    /// Apply the completion of a primary probe for `series_name`.
    pub fn report_result(&mut self, series_name: &str, accepted: bool) -> Transition {
        let from = self.state.get(series_name);
        let (to, rerun) = match (from, accepted) {
            (_, true) => (EscalationState::Normal, true),
            (EscalationState::GivenUp, false) => (EscalationState::GivenUp, false),
            (EscalationState::Normal, false) => (EscalationState::ProbingNextSeason, true),
            (EscalationState::ProbingNextSeason, false) => (EscalationState::GivenUp, false),
        };

        if to == EscalationState::Normal {
            self.state.series.remove(series_name);
        } else {
            self.state.set(series_name, to);
        }

        if from != to {
            ESCALATION_TRANSITIONS
                .with_label_values(&[to.as_str()])
                .inc();
        }

        match (from, to) {
            (EscalationState::GivenUp, EscalationState::GivenUp) => {
                debug!("Ignoring rejection for {}: already given up this run", series_name)
            }
            (_, EscalationState::ProbingNextSeason) => info!(
                "No result for {}, will try the first episode of the next season",
                series_name
            ),
            (_, EscalationState::GivenUp) => info!(
                "No result for {} in next season either, giving up for this run",
                series_name
            ),
            _ => debug!("Accepted result for {}, looking for the next episode", series_name),
        }

        if rerun {
            self.rerun_requested = true;
            RERUNS_REQUESTED.inc();
        }

        Transition { from, to, rerun }
    }

    /// Whether any report since the last `begin_run` requested a rerun.
    pub fn rerun_requested(&self) -> bool {
        self.rerun_requested
    }

    /// Read and clear the rerun signal.
    pub fn take_rerun_request(&mut self) -> bool {
        std::mem::take(&mut self.rerun_requested)
    }
}
