//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::AllocationManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<AllocationManager>,
    pub config: EnvironmentConfig,
}

impl AppState {
    pub fn new(manager: AllocationManager, config: EnvironmentConfig) -> Self {
        Self {
            manager: Arc::new(manager),
            config,
        }
    }
}
