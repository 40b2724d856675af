//! Types describing tracked series, their episodes and releases.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a series numbers its episodes.
///
/// Only `Episode` (season + episode number) can be walked forward; the other
/// schemes are recognized so they can be skipped explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentifiedBy {
    #[default]
    Episode,
    Date,
    Sequence,
    Id,
}

impl IdentifiedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifiedBy::Episode => "episode",
            IdentifiedBy::Date => "date",
            IdentifiedBy::Sequence => "sequence",
            IdentifiedBy::Id => "id",
        }
    }

    /// Parse the stored representation. Unknown values map to `Id`.
    pub fn parse(s: &str) -> Self {
        match s {
            "episode" | "ep" => IdentifiedBy::Episode,
            "date" => IdentifiedBy::Date,
            "sequence" => IdentifiedBy::Sequence,
            _ => IdentifiedBy::Id,
        }
    }
}

/// Error for invalid episode coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpisodeIdError {
    #[error("season must be between 1 and {max}, got {0}", max = EpisodeId::MAX)]
    InvalidSeason(u32),

    #[error("episode number must be between 1 and {max}, got {0}", max = EpisodeId::MAX)]
    InvalidNumber(u32),
}

/// A (season, episode) coordinate. Ordered by season, then number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeId {
    pub season: u32,
    pub number: u32,
}

impl EpisodeId {
    /// Largest accepted season or episode number.
    pub const MAX: u32 = 99_999;

    /// Create a validated episode id. Both parts must be in `1..=MAX`.
    pub fn new(season: u32, number: u32) -> Result<Self, EpisodeIdError> {
        if !(1..=Self::MAX).contains(&season) {
            return Err(EpisodeIdError::InvalidSeason(season));
        }
        if !(1..=Self::MAX).contains(&number) {
            return Err(EpisodeIdError::InvalidNumber(number));
        }
        Ok(Self { season, number })
    }

    /// The following episode in the same season, if it is still a valid id.
    pub fn next_episode(&self) -> Option<Self> {
        Self::new(self.season, self.number.checked_add(1)?).ok()
    }

    /// The first episode of the following season, if it is still a valid id.
    pub fn next_season(&self) -> Option<Self> {
        Self::new(self.season.checked_add(1)?, 1).ok()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.number)
    }
}

/// A tracked series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Unique series name.
    pub name: String,
    /// Numbering scheme.
    #[serde(default)]
    pub identified_by: IdentifiedBy,
    /// Where tracking starts, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<EpisodeId>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identified_by: IdentifiedBy::Episode,
            begin: None,
        }
    }

    pub fn with_begin(mut self, begin: EpisodeId) -> Self {
        self.begin = Some(begin);
        self
    }

    pub fn with_identified_by(mut self, identified_by: IdentifiedBy) -> Self {
        self.identified_by = identified_by;
        self
    }
}

/// A known episode and whether any of its releases was downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub season: u32,
    pub number: u32,
    pub has_downloaded_release: bool,
}

impl Episode {
    pub fn id(&self) -> EpisodeId {
        EpisodeId {
            season: self.season,
            number: self.number,
        }
    }
}

/// A concrete release seen for an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Release title as seen on the source.
    pub title: String,
    /// Whether this release was downloaded.
    pub downloaded: bool,
    /// When the release was first recorded.
    pub first_seen_at: DateTime<Utc>,
}

/// The newest downloaded episode of a series.
pub type LatestDownload = EpisodeId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_id_rejects_zero() {
        assert_eq!(EpisodeId::new(0, 1), Err(EpisodeIdError::InvalidSeason(0)));
        assert_eq!(EpisodeId::new(1, 0), Err(EpisodeIdError::InvalidNumber(0)));
        assert!(EpisodeId::new(1, 1).is_ok());
    }

    #[test]
    fn test_episode_id_rejects_oversized() {
        let max = EpisodeId::MAX;
        assert!(EpisodeId::new(max, max).is_ok());
        assert_eq!(
            EpisodeId::new(max + 1, 1),
            Err(EpisodeIdError::InvalidSeason(max + 1))
        );
        assert_eq!(
            EpisodeId::new(1, u32::MAX),
            Err(EpisodeIdError::InvalidNumber(u32::MAX))
        );
    }

    #[test]
    fn test_next_stops_at_bounds() {
        let last = EpisodeId::new(EpisodeId::MAX, EpisodeId::MAX).unwrap();
        assert_eq!(last.next_episode(), None);
        assert_eq!(last.next_season(), None);

        let unchecked = EpisodeId {
            season: u32::MAX,
            number: u32::MAX,
        };
        assert_eq!(unchecked.next_episode(), None);
        assert_eq!(unchecked.next_season(), None);
    }

    #[test]
    fn test_episode_id_ordering() {
        let s1e9 = EpisodeId::new(1, 9).unwrap();
        let s2e1 = EpisodeId::new(2, 1).unwrap();
        let s2e3 = EpisodeId::new(2, 3).unwrap();
        assert!(s1e9 < s2e1);
        assert!(s2e1 < s2e3);
        assert_eq!(s1e9.next_season(), Some(s2e1));
        assert_eq!(s2e1.next_episode(), EpisodeId::new(2, 2).ok());
    }

    #[test]
    fn test_episode_id_display() {
        assert_eq!(EpisodeId::new(2, 5).unwrap().to_string(), "S02E05");
        assert_eq!(EpisodeId::new(12, 105).unwrap().to_string(), "S12E105");
    }

    #[test]
    fn test_identified_by_serialization() {
        assert_eq!(
            serde_json::to_string(&IdentifiedBy::Episode).unwrap(),
            "\"episode\""
        );
        assert_eq!(IdentifiedBy::parse("ep"), IdentifiedBy::Episode);
        assert_eq!(IdentifiedBy::parse("date"), IdentifiedBy::Date);
        assert_eq!(IdentifiedBy::parse("whatever"), IdentifiedBy::Id);
        assert_eq!(IdentifiedBy::default(), IdentifiedBy::Episode);
    }

    #[test]
    fn test_series_deserialize_defaults() {
        let series: Series = serde_json::from_str(r#"{"name": "Show"}"#).unwrap();
        assert_eq!(series.identified_by, IdentifiedBy::Episode);
        assert!(series.begin.is_none());
    }
}
