//! Series API handlers.
//!
//! Feeds the history store: which series exist, which runs track them, and
//! which episodes and releases have been seen.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use emitter_core::{EpisodeId, EpisodeIdError, HistoryError, IdentifiedBy, Release, Series};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EpisodeBody {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeBody {
    fn id(self) -> Result<EpisodeId, EpisodeIdError> {
        EpisodeId::new(self.season, self.episode)
    }
}

/// Request body for creating or updating a series
#[derive(Debug, Deserialize)]
pub struct SeriesBody {
    pub name: String,
    #[serde(default)]
    pub identified_by: IdentifiedBy,
    #[serde(default)]
    pub begin: Option<EpisodeBody>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    pub series_name: String,
}

/// Request body for recording a release
#[derive(Debug, Deserialize)]
pub struct ReleaseBody {
    pub season: u32,
    pub episode: u32,
    pub title: String,
    #[serde(default)]
    pub downloaded: bool,
}

#[derive(Debug, Serialize)]
pub struct SeriesListResponse {
    pub series: Vec<Series>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ReleaseListResponse {
    pub releases: Vec<Release>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn invalid_episode(e: EpisodeIdError) -> ApiError {
    bad_request(format!("invalid episode: {}", e))
}

fn history_error(e: HistoryError) -> ApiError {
    let status = match e {
        HistoryError::SeriesNotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!("History store error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/series
pub async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesListResponse>, ApiError> {
    let series = state.store().list_series().map_err(history_error)?;
    let total = series.len();
    Ok(Json(SeriesListResponse { series, total }))
}

/// POST /api/v1/series
///
/// Create a series, or replace the definition of an existing one.
pub async fn upsert_series(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SeriesBody>,
) -> Result<(StatusCode, Json<Series>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(bad_request("series name must not be empty".to_string()));
    }

    let mut series = Series::new(name).with_identified_by(body.identified_by);
    if let Some(begin) = body.begin {
        series = series.with_begin(begin.id().map_err(invalid_episode)?);
    }

    state.store().upsert_series(&series).map_err(history_error)?;
    info!("Stored series {}", series.name);
    Ok((StatusCode::CREATED, Json(series)))
}

/// GET /api/v1/series/{name}
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Series>, ApiError> {
    state
        .store()
        .get_series(&name)
        .map(Json)
        .map_err(history_error)
}

/// POST /api/v1/series/{name}/episodes
///
/// Record that an episode exists, with or without releases.
pub async fn record_episode(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<EpisodeBody>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let id = body.id().map_err(invalid_episode)?;
    state
        .store()
        .record_episode(&name, id)
        .map_err(history_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: format!("Recorded {} {}", name, id),
        }),
    ))
}

/// POST /api/v1/series/{name}/releases
pub async fn record_release(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<ReleaseBody>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let id = EpisodeId::new(body.season, body.episode).map_err(invalid_episode)?;
    if body.title.trim().is_empty() {
        return Err(bad_request("release title must not be empty".to_string()));
    }

    state
        .store()
        .record_release(&name, id, &body.title, body.downloaded)
        .map_err(history_error)?;
    if body.downloaded {
        info!("Recorded download of {} for {} {}", body.title, name, id);
    }
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: format!("Recorded release {} for {} {}", body.title, name, id),
        }),
    ))
}

/// GET /api/v1/series/{name}/episodes/{season}/{episode}/releases
pub async fn list_releases(
    State(state): State<Arc<AppState>>,
    Path((name, season, episode)): Path<(String, u32, u32)>,
) -> Result<Json<ReleaseListResponse>, ApiError> {
    let id = EpisodeId::new(season, episode).map_err(invalid_episode)?;
    let releases = state.store().releases(&name, id).map_err(history_error)?;
    let total = releases.len();
    Ok(Json(ReleaseListResponse { releases, total }))
}

/// POST /api/v1/runs/{run_id}/series
///
/// Make a stored series part of a run.
pub async fn assign_to_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .store()
        .assign_to_run(&run_id, &body.series_name)
        .map_err(history_error)?;
    info!("Run {} now tracks {}", run_id, body.series_name);
    Ok(Json(SuccessResponse {
        message: format!("Run {} tracks {}", run_id, body.series_name),
    }))
}
