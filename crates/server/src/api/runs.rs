//! Run API handlers.
//!
//! An external scheduler drives runs through these endpoints:
//! start (or rerun) a run, hand the search requests to its searcher, report
//! each tracked result, then consume the rerun signal.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use emitter_core::{EmitError, RunState, RunStatus, SearchRequest, Transition};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRunParams {
    /// Continue the existing run instead of starting fresh.
    #[serde(default)]
    pub rerun: bool,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub run_id: String,
    pub rerun: bool,
    pub requests: Vec<SearchRequest>,
    pub status: RunStatus,
}

/// Request body for reporting a search result
#[derive(Debug, Deserialize)]
pub struct ReportBody {
    pub series_name: String,
    pub season: u32,
    pub episode: u32,
    pub accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Whether the result matched a pending primary probe.
    pub forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    pub rerun_requested: bool,
}

#[derive(Debug, Serialize)]
pub struct RerunResponse {
    pub rerun_requested: bool,
}

#[derive(Debug, Serialize)]
pub struct RunDetailResponse {
    pub status: RunStatus,
    pub escalation: RunState,
}

#[derive(Debug, Serialize)]
pub struct RunListResponse {
    pub runs: Vec<RunStatus>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn run_not_found(run_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Run not found: {}", run_id),
        }),
    )
}

fn emit_error(run_id: &str, e: EmitError) -> ApiError {
    let status = match e {
        EmitError::InvalidEpisode(_) => StatusCode::BAD_REQUEST,
        EmitError::History(_) => {
            error!("Run {} failed: {}", run_id, e);
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

/// GET /api/v1/runs
pub async fn list_runs(State(state): State<Arc<AppState>>) -> Json<RunListResponse> {
    let runs = state.runs().lock().await;
    let mut statuses: Vec<RunStatus> = runs.values().map(|run| run.status()).collect();
    statuses.sort_by(|a, b| a.run_id.cmp(&b.run_id));
    let total = statuses.len();
    Json(RunListResponse {
        runs: statuses,
        total,
    })
}

/// POST /api/v1/runs/{run_id}?rerun=<bool>
///
/// Compute the search requests for a run. Without `rerun` the run starts
/// fresh; with it, escalation state from earlier invocations is kept.
pub async fn start_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Query(params): Query<StartRunParams>,
) -> Result<Json<RunResponse>, ApiError> {
    let mut runs = state.runs().lock().await;
    let run = if params.rerun {
        runs.get_mut(&run_id)
            .ok_or_else(|| run_not_found(&run_id))?
    } else {
        runs.entry(run_id.clone())
            .or_insert_with(|| state.new_run(&run_id))
    };

    let requests = run
        .compute(params.rerun)
        .map_err(|e| emit_error(&run_id, e))?;

    if !params.rerun {
        info!("Started run {}", run_id);
    }

    Ok(Json(RunResponse {
        run_id,
        rerun: params.rerun,
        requests,
        status: run.status(),
    }))
}

/// GET /api/v1/runs/{run_id}
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RunDetailResponse>, ApiError> {
    let runs = state.runs().lock().await;
    let run = runs.get(&run_id).ok_or_else(|| run_not_found(&run_id))?;
    Ok(Json(RunDetailResponse {
        status: run.status(),
        escalation: run.run_state().clone(),
    }))
}

/// DELETE /api/v1/runs/{run_id}
///
/// End (or abort) a run, discarding its escalation state.
pub async fn delete_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut runs = state.runs().lock().await;
    match runs.remove(&run_id) {
        Some(_) => {
            info!("Discarded run {}", run_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(run_not_found(&run_id)),
    }
}

/// POST /api/v1/runs/{run_id}/results
pub async fn report_result(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse>, ApiError> {
    let mut runs = state.runs().lock().await;
    let run = runs
        .get_mut(&run_id)
        .ok_or_else(|| run_not_found(&run_id))?;

    let transition = run
        .report_result(&body.series_name, body.season, body.episode, body.accepted)
        .map_err(|e| emit_error(&run_id, e))?;

    Ok(Json(ReportResponse {
        forwarded: transition.is_some(),
        transition,
        rerun_requested: run.rerun_requested(),
    }))
}

/// POST /api/v1/runs/{run_id}/rerun-request
///
/// Consume the rerun signal. Returns whether a rerun was requested since the
/// last invocation.
pub async fn take_rerun_request(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<Json<RerunResponse>, ApiError> {
    let mut runs = state.runs().lock().await;
    let run = runs
        .get_mut(&run_id)
        .ok_or_else(|| run_not_found(&run_id))?;
    Ok(Json(RerunResponse {
        rerun_requested: run.take_rerun_request(),
    }))
}
