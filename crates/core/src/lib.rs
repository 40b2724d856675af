pub mod config;
pub mod emitter;
pub mod history;
pub mod metrics;
pub mod series;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    SanitizedConfig, ServerConfig,
};
pub use emitter::{
    compute_probes, DefaultSearchStrings, Detection, EmitError, EmitRun, EmitterConfig,
    EscalationController, EscalationState, GapCandidates, ProbeKind, ProbeRequest,
    RequestEmitter, RunState, RunStatus, SearchRequest, SearchStringBuilder, Transition,
};
pub use history::{DownloadHistory, HistoryError, SeriesCatalog, SqliteHistory};
pub use series::{
    Episode, EpisodeId, EpisodeIdError, IdentifiedBy, LatestDownload, Release, Series,
};
