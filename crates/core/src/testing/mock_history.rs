//! In-memory series catalog and download history for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::history::{DownloadHistory, HistoryError, SeriesCatalog};
use crate::series::{Episode, EpisodeId, LatestDownload, Series};

/// A recorded `episodes_in_season` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonQuery {
    pub series_name: String,
    pub season: u32,
}

#[derive(Debug, Default)]
struct Inner {
    /// run id -> series (ordered by name)
    runs: HashMap<String, BTreeMap<String, Series>>,
    /// series name -> episode id -> downloaded
    episodes: HashMap<String, BTreeMap<EpisodeId, bool>>,
    season_queries: Vec<SeasonQuery>,
    next_error: Option<String>,
}

/// Mock implementation of both history traits.
///
/// Cheap to clone; clones share the same data.
///
/// # Example
///
/// ```rust,ignore
/// use emitter_core::testing::MockHistory;
///
/// let history = MockHistory::new();
/// history.add_series("tv", Series::new("Show"));
/// history.add_episode("Show", EpisodeId::new(1, 1)?, true);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHistory {
    inner: Arc<Mutex<Inner>>,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Track `series` in `run_id`, replacing any previous definition.
    pub fn add_series(&self, run_id: &str, series: Series) {
        self.lock()
            .runs
            .entry(run_id.to_string())
            .or_default()
            .insert(series.name.clone(), series);
    }

    /// Record an episode. `downloaded` marks it as having a downloaded release.
    pub fn add_episode(&self, series_name: &str, episode: EpisodeId, downloaded: bool) {
        let mut inner = self.lock();
        let entry = inner
            .episodes
            .entry(series_name.to_string())
            .or_default()
            .entry(episode)
            .or_insert(false);
        *entry |= downloaded;
    }

    /// Record `count` episodes `1..=count` of `season`, all downloaded.
    pub fn add_downloaded_season(&self, series_name: &str, season: u32, count: u32) {
        for number in 1..=count {
            self.add_episode(series_name, EpisodeId { season, number }, true);
        }
    }

    /// Make the next lookup fail with a database error.
    pub fn fail_next(&self, message: &str) {
        self.lock().next_error = Some(message.to_string());
    }

    /// Recorded `episodes_in_season` lookups.
    pub fn season_queries(&self) -> Vec<SeasonQuery> {
        self.lock().season_queries.clone()
    }

    fn take_error(inner: &mut Inner) -> Result<(), HistoryError> {
        match inner.next_error.take() {
            Some(message) => Err(HistoryError::Database(message)),
            None => Ok(()),
        }
    }
}

impl SeriesCatalog for MockHistory {
    fn list_series_for_run(&self, run_id: &str) -> Result<Vec<Series>, HistoryError> {
        let mut inner = self.lock();
        Self::take_error(&mut inner)?;
        Ok(inner
            .runs
            .get(run_id)
            .map(|series| series.values().cloned().collect())
            .unwrap_or_default())
    }
}

impl DownloadHistory for MockHistory {
    fn latest_download(&self, series: &Series) -> Result<Option<LatestDownload>, HistoryError> {
        let mut inner = self.lock();
        Self::take_error(&mut inner)?;
        Ok(inner.episodes.get(&series.name).and_then(|episodes| {
            episodes
                .iter()
                .filter(|(_, downloaded)| **downloaded)
                .map(|(id, _)| *id)
                .next_back()
        }))
    }

    fn episodes_in_season(
        &self,
        series: &Series,
        season: u32,
    ) -> Result<Vec<Episode>, HistoryError> {
        let mut inner = self.lock();
        Self::take_error(&mut inner)?;
        inner.season_queries.push(SeasonQuery {
            series_name: series.name.clone(),
            season,
        });
        Ok(inner
            .episodes
            .get(&series.name)
            .map(|episodes| {
                episodes
                    .iter()
                    .filter(|(id, _)| id.season == season)
                    .map(|(id, downloaded)| Episode {
                        season: id.season,
                        number: id.number,
                        has_downloaded_release: *downloaded,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(season: u32, number: u32) -> EpisodeId {
        EpisodeId::new(season, number).unwrap()
    }

    #[test]
    fn test_latest_download() {
        let history = MockHistory::new();
        history.add_episode("Show", ep(1, 5), true);
        history.add_episode("Show", ep(2, 1), true);
        history.add_episode("Show", ep(2, 2), false);

        let latest = history.latest_download(&Series::new("Show")).unwrap();
        assert_eq!(latest, Some(ep(2, 1)));
        assert!(history
            .latest_download(&Series::new("Other"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_fail_next_only_once() {
        let history = MockHistory::new();
        history.fail_next("boom");
        assert!(history.list_series_for_run("tv").is_err());
        assert!(history.list_series_for_run("tv").is_ok());
    }

    #[test]
    fn test_season_queries_recorded() {
        let history = MockHistory::new();
        history.add_downloaded_season("Show", 3, 4);
        let episodes = history.episodes_in_season(&Series::new("Show"), 3).unwrap();
        assert_eq!(episodes.len(), 4);
        assert_eq!(
            history.season_queries(),
            vec![SeasonQuery {
                series_name: "Show".to_string(),
                season: 3
            }]
        );
    }
}
