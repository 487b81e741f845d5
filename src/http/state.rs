// src/http/state.rs

use std::sync::Arc;

use crate::backup::BackupLocator;
use crate::config::ConfigFile;
use crate::staging::StagingStore;
use crate::supervisor::ProcessSupervisor;

/// Shared state handed to every handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub supervisor: ProcessSupervisor,
    pub staging: StagingStore,
    pub locator: BackupLocator,
    pub config: Arc<ConfigFile>,
}

impl AppState {
    pub fn new(
        supervisor: ProcessSupervisor,
        locator: BackupLocator,
        config: Arc<ConfigFile>,
    ) -> Self {
        Self {
            staging: supervisor.staging().clone(),
            supervisor,
            locator,
            config,
        }
    }
}
