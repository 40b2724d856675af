//! Probe requests produced by gap detection.

use serde::{Deserialize, Serialize};

use crate::series::EpisodeId;

/// Why an episode is being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// The episode may not exist yet. Its completion drives escalation.
    Primary,
    /// The episode is known to exist but was never downloaded. Untracked.
    GapFill,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Primary => "primary",
            ProbeKind::GapFill => "gap_fill",
        }
    }

    /// Whether a completion report for this probe is forwarded to escalation.
    pub fn is_tracked(&self) -> bool {
        matches!(self, ProbeKind::Primary)
    }
}

/// A single episode to search for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub series_name: String,
    pub episode: EpisodeId,
    pub kind: ProbeKind,
}

impl ProbeRequest {
    pub fn primary(series_name: impl Into<String>, episode: EpisodeId) -> Self {
        Self {
            series_name: series_name.into(),
            episode,
            kind: ProbeKind::Primary,
        }
    }

    pub fn gap_fill(series_name: impl Into<String>, episode: EpisodeId) -> Self {
        Self {
            series_name: series_name.into(),
            episode,
            kind: ProbeKind::GapFill,
        }
    }
}
