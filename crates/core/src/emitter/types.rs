//! Types for emission runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while computing a run.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Catalog or history lookup failed.
    #[error("history error: {0}")]
    History(#[from] crate::history::HistoryError),

    /// Invalid episode coordinates in a report.
    #[error("invalid episode: {0}")]
    InvalidEpisode(#[from] crate::series::EpisodeIdError),
}

/// Snapshot of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Invocations so far, the first one included.
    pub invocations: u32,
    /// Primary probes still waiting for a result.
    pub pending_reports: usize,
    pub rerun_requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryError;
    use crate::series::EpisodeIdError;

    #[test]
    fn test_error_display() {
        let err = EmitError::from(HistoryError::Database("locked".to_string()));
        assert_eq!(err.to_string(), "history error: Database error: locked");

        let err = EmitError::from(EpisodeIdError::InvalidSeason(0));
        assert_eq!(err.to_string(), "invalid episode: season must be between 1 and 99999, got 0");
    }

    #[test]
    fn test_run_status_serialization() {
        let status = RunStatus {
            run_id: "tv".to_string(),
            started_at: Utc::now(),
            invocations: 2,
            pending_reports: 1,
            rerun_requested: false,
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "tv");
        assert_eq!(parsed.invocations, 2);
    }
}
