//! Gap detection: which episodes of a series should be searched for next.

use std::collections::BTreeSet;

use tracing::warn;

use super::escalation::{EscalationState, RunState};
use super::probe::ProbeRequest;
use crate::series::{Episode, EpisodeId, IdentifiedBy, LatestDownload, Series};

/// Outcome of gap detection for one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The series is not numbered by (season, episode) and cannot be walked.
    Unsupported(IdentifiedBy),
    /// Probes to emit, gap-fills first, in ascending episode order.
    Probes(Vec<ProbeRequest>),
}

impl Detection {
    /// The probes to emit; an unsupported series has none.
    pub fn into_probes(self) -> Vec<ProbeRequest> {
        match self {
            Detection::Unsupported(_) => Vec::new(),
            Detection::Probes(probes) => probes,
        }
    }
}

/// Episode numbers of one season still missing.
///
/// Removing a number outside the set is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapCandidates {
    numbers: BTreeSet<u32>,
}

impl GapCandidates {
    /// All numbers in `lo..=hi`, clamped to `1..=EpisodeId::MAX`.
    pub fn range(lo: u32, hi: u32) -> Self {
        Self {
            numbers: (lo.max(1)..=hi.min(EpisodeId::MAX)).collect(),
        }
    }

    /// Remove `number`, returning whether it was present.
    pub fn remove(&mut self, number: u32) -> bool {
        self.numbers.remove(&number)
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Remaining numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }
}

/// Compute the probes for `series`.
///
/// `episodes_of_latest_season` must hold every known episode of the series in
/// `latest.season`; it is ignored when `latest` is `None`. The result depends
/// only on the arguments.
pub fn compute_probes(
    series: &Series,
    latest: Option<LatestDownload>,
    episodes_of_latest_season: &[Episode],
    run_state: &RunState,
) -> Detection {
    if series.identified_by != IdentifiedBy::Episode {
        return Detection::Unsupported(series.identified_by);
    }

    if let Some(begin) = series.begin {
        if latest.map_or(true, |latest| latest < begin) {
            return Detection::Probes(vec![ProbeRequest::primary(&series.name, begin)]);
        }
    }

    let Some(latest) = latest else {
        return Detection::Probes(Vec::new());
    };

    let mut probes = Vec::new();

    let newest_known = episodes_of_latest_season
        .iter()
        .filter(|episode| episode.season == latest.season)
        .max_by_key(|episode| episode.number);

    let hi_downloaded = match newest_known {
        Some(newest) => {
            let lo = match series.begin {
                Some(begin) if begin.season == latest.season => begin.number,
                _ => 1,
            };

            let mut gaps = GapCandidates::range(lo, newest.number);
            for episode in episodes_of_latest_season
                .iter()
                .filter(|episode| episode.season == latest.season && episode.has_downloaded_release)
            {
                gaps.remove(episode.number);
            }

            probes.extend(gaps.iter().map(|number| {
                ProbeRequest::gap_fill(
                    &series.name,
                    EpisodeId {
                        season: latest.season,
                        number,
                    },
                )
            }));

            newest.has_downloaded_release.then_some(newest.id())
        }
        None => {
            warn!(
                "{} has a download at {} but no episodes recorded for season {}, probing the next episode only",
                series.name, latest, latest.season
            );
            Some(latest)
        }
    };

    let next = if run_state.get(&series.name) == EscalationState::ProbingNextSeason {
        Some(latest.next_season())
    } else {
        hi_downloaded.map(|hi| hi.next_episode())
    };
    match next {
        Some(Some(episode)) => probes.push(ProbeRequest::primary(&series.name, episode)),
        Some(None) => warn!(
            "{} is at the largest supported episode id, no primary probe",
            series.name
        ),
        None => {}
    }

    Detection::Probes(probes)
}
