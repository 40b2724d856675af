//! Turns probes into outbound search requests and routes completion reports
//! of primary probes back into escalation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::escalation::{EscalationController, Transition};
use super::probe::{ProbeKind, ProbeRequest};
use crate::series::EpisodeId;

/// Builds the alternate search strings for one episode.
pub trait SearchStringBuilder: Send + Sync {
    /// Search strings for `series_name` at `episode`, most specific first.
    fn search_strings(&self, series_name: &str, episode: EpisodeId) -> Vec<String>;
}

/// `"Name S01E02"` and `"Name 01x02"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSearchStrings;

impl SearchStringBuilder for DefaultSearchStrings {
    fn search_strings(&self, series_name: &str, episode: EpisodeId) -> Vec<String> {
        vec![
            format!(
                "{} S{:02}E{:02}",
                series_name, episode.season, episode.number
            ),
            format!(
                "{} {:02}x{:02}",
                series_name, episode.season, episode.number
            ),
        ]
    }
}

/// An outbound search for one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Display title (the first search string).
    pub title: String,
    pub search_strings: Vec<String>,
    pub series_name: String,
    pub season: u32,
    pub episode: u32,
    /// `SxxEyy` identifier.
    pub series_id: String,
    pub kind: ProbeKind,
    /// Whether the searcher must report the result back.
    pub tracked: bool,
}

/// Correlates a completion report with the primary probe that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeKey {
    pub series_name: String,
    pub episode: EpisodeId,
}

/// Builds search requests and holds the completion hooks of primary probes.
///
/// Every emitted primary probe owns one hook, so a probe emitted again by a
/// rerun before its first result arrives expects two results.
pub struct RequestEmitter {
    builder: Box<dyn SearchStringBuilder>,
    hooks: HashMap<ProbeKey, usize>,
}

impl std::fmt::Debug for RequestEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEmitter")
            .field("builder", &"<builder>")
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Default for RequestEmitter {
    fn default() -> Self {
        Self::new(Box::new(DefaultSearchStrings))
    }
}

impl RequestEmitter {
    pub fn new(builder: Box<dyn SearchStringBuilder>) -> Self {
        Self {
            builder,
            hooks: HashMap::new(),
        }
    }

    /// Build the search request for `probe`, registering a completion hook
    /// when the probe is tracked.
    pub fn emit(&mut self, probe: &ProbeRequest) -> SearchRequest {
        let search_strings = self
            .builder
            .search_strings(&probe.series_name, probe.episode);
        let title = search_strings
            .first()
            .cloned()
            .unwrap_or_else(|| format!("{} {}", probe.series_name, probe.episode));

        let tracked = probe.kind.is_tracked();
        if tracked {
            *self
                .hooks
                .entry(ProbeKey {
                    series_name: probe.series_name.clone(),
                    episode: probe.episode,
                })
                .or_default() += 1;
        }

        SearchRequest {
            title,
            search_strings,
            series_name: probe.series_name.clone(),
            season: probe.episode.season,
            episode: probe.episode.number,
            series_id: probe.episode.to_string(),
            kind: probe.kind,
            tracked,
        }
    }

    /// Number of primary probes still waiting for a result.
    pub fn pending(&self) -> usize {
        self.hooks.values().sum()
    }

    /// Drop every registered hook.
    pub fn clear(&mut self) {
        self.hooks.clear();
    }

    /// Deliver a search result.
    ///
    /// Only results for registered primary probes reach the controller; each
    /// hook fires once. Anything else returns `None`.
    pub fn report_result(
        &mut self,
        controller: &mut EscalationController,
        series_name: &str,
        episode: EpisodeId,
        accepted: bool,
    ) -> Option<Transition> {
        let key = ProbeKey {
            series_name: series_name.to_string(),
            episode,
        };
        let Some(count) = self.hooks.get_mut(&key) else {
            debug!(
                "No pending primary probe for {} {}, ignoring result",
                series_name, episode
            );
            return None;
        };
        *count -= 1;
        if *count == 0 {
            self.hooks.remove(&key);
        }
        Some(controller.report_result(series_name, accepted))
    }
}
