//! Read-only collaborators the emitter consumes: which series belong to a run,
//! and what has already been downloaded for them.
//!
//! `SqliteHistory` implements both traits on top of a local database. Tests
//! and embedders can supply their own implementations.

mod sqlite;
mod types;

pub use sqlite::SqliteHistory;
pub use types::*;

use crate::series::{Episode, LatestDownload, Series};

/// Source of the series configured for a run.
pub trait SeriesCatalog: Send + Sync {
    /// List the series tracked by the given run, ordered by name.
    fn list_series_for_run(&self, run_id: &str) -> Result<Vec<Series>, HistoryError>;
}

/// Download history per series.
pub trait DownloadHistory: Send + Sync {
    /// The downloaded episode with the greatest (season, number), if any.
    fn latest_download(&self, series: &Series) -> Result<Option<LatestDownload>, HistoryError>;

    /// Every known episode of `series` in `season`, ordered by number.
    fn episodes_in_season(&self, series: &Series, season: u32)
        -> Result<Vec<Episode>, HistoryError>;
}
