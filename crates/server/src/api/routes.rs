use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, runs, series};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Runs
        .route("/runs", get(runs::list_runs))
        .route(
            "/runs/{run_id}",
            post(runs::start_run)
                .get(runs::get_run)
                .delete(runs::delete_run),
        )
        .route("/runs/{run_id}/results", post(runs::report_result))
        .route("/runs/{run_id}/rerun-request", post(runs::take_rerun_request))
        .route("/runs/{run_id}/series", post(series::assign_to_run))
        // Series and download history
        .route(
            "/series",
            get(series::list_series).post(series::upsert_series),
        )
        .route("/series/{name}", get(series::get_series))
        .route("/series/{name}/episodes", post(series::record_episode))
        .route("/series/{name}/releases", post(series::record_release))
        .route(
            "/series/{name}/episodes/{season}/{episode}/releases",
            get(series::list_releases),
        )
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
}
