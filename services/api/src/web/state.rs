//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use booktrack_core::dashboard::DashboardBuilder;
use booktrack_core::ports::{ReadingDnaSource, Storage};

use crate::config::Config;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub dna: Arc<dyn ReadingDnaSource>,
    pub dashboard: DashboardBuilder,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        dna: Arc<dyn ReadingDnaSource>,
        config: Arc<Config>,
    ) -> Self {
        let dashboard = DashboardBuilder::new(storage.clone(), config.dashboard_tuning());
        Self {
            storage,
            dna,
            dashboard,
            config,
        }
    }
}
