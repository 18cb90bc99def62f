//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::ColorTimeService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: ColorTimeService,
}

impl AppState {
    /// State over `repository` with the system clock and random ids.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            service: ColorTimeService::new(repository),
        }
    }

    pub fn with_service(service: ColorTimeService) -> Self {
        Self { service }
    }
}
