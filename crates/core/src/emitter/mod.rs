//! Next-episode emission.
//!
//! For every series of a run the emitter works out which episodes to search
//! for next:
//! - **Gap-fill** probes for episodes history knows about but never downloaded
//! - **Primary** probes for the episode after the newest known one, or for the
//!   first episode of the next season once a primary probe came back empty
//!
//! Results of primary probes drive a bounded escalation that may ask the
//! scheduler to rerun the computation.

mod config;
mod escalation;
mod gaps;
mod probe;
mod request;
mod run;
mod types;

pub use config::EmitterConfig;
pub use escalation::{EscalationController, EscalationState, RunState, Transition};
pub use gaps::{compute_probes, Detection, GapCandidates};
pub use probe::{ProbeKind, ProbeRequest};
pub use request::{
    DefaultSearchStrings, ProbeKey, RequestEmitter, SearchRequest, SearchStringBuilder,
};
pub use run::EmitRun;
pub use types::{EmitError, RunStatus};
