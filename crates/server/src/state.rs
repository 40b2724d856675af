use std::collections::HashMap;
use std::sync::Arc;

use emitter_core::{
    Config, DownloadHistory, EmitRun, SanitizedConfig, SeriesCatalog, SqliteHistory,
};
use tokio::sync::Mutex;

/// Shared application state
pub struct AppState {
    config: Config,
    /// Store written through the series API.
    store: Arc<SqliteHistory>,
    catalog: Arc<dyn SeriesCatalog>,
    history: Arc<dyn DownloadHistory>,
    /// Runs in progress, keyed by run id. A run lives from its first fresh
    /// invocation until it is deleted or restarted.
    runs: Mutex<HashMap<String, EmitRun>>,
}

impl AppState {
    /// Build state over `store`, which also backs the catalog and history
    /// that runs read from.
    pub fn new(config: Config, store: Arc<SqliteHistory>) -> Self {
        let catalog: Arc<dyn SeriesCatalog> = store.clone();
        let history: Arc<dyn DownloadHistory> = store.clone();
        Self {
            config,
            store,
            catalog,
            history,
            runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &SqliteHistory {
        &self.store
    }

    pub fn runs(&self) -> &Mutex<HashMap<String, EmitRun>> {
        &self.runs
    }

    /// Create a run bound to this server's catalog and history.
    pub fn new_run(&self, run_id: &str) -> EmitRun {
        EmitRun::new(
            run_id,
            self.config.emitter.clone(),
            Arc::clone(&self.catalog),
            Arc::clone(&self.history),
        )
    }
}
