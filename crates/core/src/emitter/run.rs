//! One emission run: catalog and history in, search requests out, completion
//! reports back in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::config::EmitterConfig;
use super::escalation::{EscalationController, RunState, Transition};
use super::gaps::{compute_probes, Detection};
use super::request::{RequestEmitter, SearchRequest, SearchStringBuilder};
use super::types::{EmitError, RunStatus};
use crate::history::{DownloadHistory, SeriesCatalog};
use crate::metrics::{PROBES_EMITTED, SERIES_SKIPPED};
use crate::series::{EpisodeId, IdentifiedBy};

/// State of a single run across its reruns.
///
/// The scheduler calls [`EmitRun::compute`] once with `is_rerun = false`,
/// forwards search results through [`EmitRun::report_result`], and calls
/// `compute(true)` again whenever [`EmitRun::take_rerun_request`] says so.
/// Bounding the number of reruns is the scheduler's job.
pub struct EmitRun {
    run_id: String,
    config: EmitterConfig,
    catalog: Arc<dyn SeriesCatalog>,
    history: Arc<dyn DownloadHistory>,
    controller: EscalationController,
    emitter: RequestEmitter,
    started_at: DateTime<Utc>,
    invocations: u32,
}

impl std::fmt::Debug for EmitRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitRun")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .field("controller", &self.controller)
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

impl EmitRun {
    pub fn new(
        run_id: impl Into<String>,
        config: EmitterConfig,
        catalog: Arc<dyn SeriesCatalog>,
        history: Arc<dyn DownloadHistory>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            config,
            catalog,
            history,
            controller: EscalationController::new(),
            emitter: RequestEmitter::default(),
            started_at: Utc::now(),
            invocations: 0,
        }
    }

    /// Use a custom search string format.
    pub fn with_search_strings(mut self, builder: Box<dyn SearchStringBuilder>) -> Self {
        self.emitter = RequestEmitter::new(builder);
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Compute the search requests for every series of this run.
    ///
    /// A fresh invocation (`is_rerun = false`) discards escalation state and
    /// pending hooks from earlier invocations.
    pub fn compute(&mut self, is_rerun: bool) -> Result<Vec<SearchRequest>, EmitError> {
        self.controller.begin_run(is_rerun);
        if !is_rerun {
            self.emitter.clear();
            self.started_at = Utc::now();
            self.invocations = 0;
        }
        self.invocations += 1;

        if !self.config.enabled {
            debug!("Emitter disabled, run {} emits nothing", self.run_id);
            return Ok(Vec::new());
        }

        let series_list = self.catalog.list_series_for_run(&self.run_id)?;
        let mut requests = Vec::new();

        for series in &series_list {
            let latest = match series.identified_by {
                IdentifiedBy::Episode => self.history.latest_download(series)?,
                _ => None,
            };
            let episodes = match latest {
                Some(latest) => self.history.episodes_in_season(series, latest.season)?,
                None => Vec::new(),
            };

            match compute_probes(series, latest, &episodes, self.controller.run_state()) {
                Detection::Unsupported(identified_by) => {
                    debug!(
                        "Cannot discover {}: identified by {}, not by episode",
                        series.name,
                        identified_by.as_str()
                    );
                    SERIES_SKIPPED.with_label_values(&["unsupported"]).inc();
                }
                Detection::Probes(probes) if probes.is_empty() => {
                    debug!("Nothing to search for {} yet", series.name);
                    SERIES_SKIPPED.with_label_values(&["no_history"]).inc();
                }
                Detection::Probes(probes) => {
                    for probe in &probes {
                        PROBES_EMITTED
                            .with_label_values(&[probe.kind.as_str()])
                            .inc();
                        requests.push(self.emitter.emit(probe));
                    }
                }
            }
        }

        info!(
            "Run {} ({}invocation {}): {} search requests for {} series",
            self.run_id,
            if is_rerun { "rerun, " } else { "" },
            self.invocations,
            requests.len(),
            series_list.len()
        );

        Ok(requests)
    }

    /// Deliver the outcome of a search.
    ///
    /// Returns the escalation transition if the result belonged to a pending
    /// primary probe.
    pub fn report_result(
        &mut self,
        series_name: &str,
        season: u32,
        number: u32,
        accepted: bool,
    ) -> Result<Option<Transition>, EmitError> {
        let episode = EpisodeId::new(season, number)?;
        Ok(self
            .emitter
            .report_result(&mut self.controller, series_name, episode, accepted))
    }

    pub fn rerun_requested(&self) -> bool {
        self.controller.rerun_requested()
    }

    /// Read and clear the rerun signal.
    pub fn take_rerun_request(&mut self) -> bool {
        self.controller.take_rerun_request()
    }

    pub fn run_state(&self) -> &RunState {
        self.controller.run_state()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            invocations: self.invocations,
            pending_reports: self.emitter.pending(),
            rerun_requested: self.controller.rerun_requested(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::escalation::EscalationState;
    use crate::emitter::probe::ProbeKind;
    use crate::series::Series;
    use crate::testing::MockHistory;

    fn ep(season: u32, number: u32) -> EpisodeId {
        EpisodeId::new(season, number).unwrap()
    }

    fn run_with(history: MockHistory, config: EmitterConfig) -> EmitRun {
        let history = Arc::new(history);
        EmitRun::new("tv", config, history.clone(), history)
    }

    #[test]
    fn test_disabled_emits_nothing() {
        let history = MockHistory::new();
        history.add_series("tv", Series::new("Show").with_begin(ep(1, 1)));
        let mut run = run_with(
            history,
            EmitterConfig { enabled: false },
        );

        assert!(run.compute(false).unwrap().is_empty());
        assert_eq!(run.status().invocations, 1);
    }

    #[test]
    fn test_unsupported_series_skipped() {
        let history = MockHistory::new();
        history.add_series(
            "tv",
            Series::new("Daily").with_identified_by(IdentifiedBy::Date),
        );
        history.add_series("tv", Series::new("Show").with_begin(ep(1, 1)));
        let mut run = run_with(history, EmitterConfig::default());

        let requests = run.compute(false).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].series_name, "Show");
    }

    #[test]
    fn test_history_failure_propagates() {
        let history = MockHistory::new();
        history.add_series("tv", Series::new("Show"));
        history.fail_next("boom");
        let mut run = run_with(history, EmitterConfig::default());

        let result = run.compute(false);
        assert!(matches!(result, Err(EmitError::History(_))));
    }

    #[test]
    fn test_report_rejects_invalid_episode() {
        let mut run = run_with(MockHistory::new(), EmitterConfig::default());
        let result = run.report_result("Show", 0, 1, true);
        assert!(matches!(result, Err(EmitError::InvalidEpisode(_))));
    }

    #[test]
    fn test_escalation_over_reruns() {
        let history = MockHistory::new();
        history.add_series("tv", Series::new("Show"));
        history.add_episode("Show", ep(1, 1), true);
        history.add_episode("Show", ep(1, 2), true);
        let mut run = run_with(history, EmitterConfig::default());

        let requests = run.compute(false).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!((requests[0].season, requests[0].episode), (1, 3));
        assert_eq!(requests[0].kind, ProbeKind::Primary);

        run.report_result("Show", 1, 3, false).unwrap();
        assert!(run.take_rerun_request());

        let requests = run.compute(true).unwrap();
        assert_eq!((requests[0].season, requests[0].episode), (2, 1));

        let transition = run.report_result("Show", 2, 1, false).unwrap().unwrap();
        assert_eq!(transition.to, EscalationState::GivenUp);
        assert!(!run.rerun_requested());

        run.compute(false).unwrap();
        assert_eq!(run.run_state().get("Show"), EscalationState::Normal);
        assert_eq!(run.status().invocations, 1);
    }
}
