//! Testing utilities and mock implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use emitter_core::testing::{fixtures, MockHistory};
//!
//! let history = MockHistory::new();
//! history.add_series("tv", fixtures::series("Show"));
//! history.add_downloaded_season("Show", 1, 10);
//! ```

mod mock_history;

pub use mock_history::{MockHistory, SeasonQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::MockHistory;
    use crate::emitter::{EmitRun, EmitterConfig};
    use crate::series::{EpisodeId, Series};

    /// An episode id. Panics on zero.
    pub fn ep(season: u32, number: u32) -> EpisodeId {
        EpisodeId::new(season, number).expect("valid episode id")
    }

    /// A series identified by episode, without a begin point.
    pub fn series(name: &str) -> Series {
        Series::new(name)
    }

    /// A series that starts tracking at `season`/`number`.
    pub fn series_from(name: &str, season: u32, number: u32) -> Series {
        Series::new(name).with_begin(ep(season, number))
    }

    /// A run over `history` with the default configuration.
    pub fn run(run_id: &str, history: &MockHistory) -> EmitRun {
        let history = Arc::new(history.clone());
        EmitRun::new(run_id, EmitterConfig::default(), history.clone(), history)
    }
}
