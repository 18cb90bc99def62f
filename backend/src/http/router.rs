//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Weeks
        .route("/weeks", get(handlers::get_or_create_week))
        .route("/weeks/normalize", post(handlers::normalize_tracking))
        .route("/weeks/{week_id}", get(handlers::get_week))
        .route(
            "/weeks/{week_id}/slots/{slot_id}",
            put(handlers::update_week_slot),
        )
        .route(
            "/weeks/{week_id}/topic",
            put(handlers::set_week_topic).delete(handlers::clear_week_topic),
        )
        .route(
            "/weeks/{week_id}/days/{date}/topic",
            put(handlers::set_day_topic).delete(handlers::clear_day_topic),
        )
        // Default days
        .route("/default-days", get(handlers::get_default_days))
        .route("/default-days/range", get(handlers::list_default_days_in_range))
        .route("/default-days/slots", post(handlers::create_default_slot))
        .route("/default-days/{day_id}", delete(handlers::delete_default_day))
        .route(
            "/default-days/{day_id}/slots/{slot_id}",
            patch(handlers::update_default_slot).delete(handlers::delete_default_slot),
        )
        .route(
            "/default-days/{day_id}/slots/{slot_id}/block",
            get(handlers::find_block_by_slot),
        )
        .route(
            "/default-days/{day_id}/blocks/{block_id}",
            delete(handlers::delete_default_block),
        )
        // Templates
        .route("/templates", get(handlers::get_templates))
        .route("/templates/slots", post(handlers::create_template_slot))
        .route("/templates/duplicate", post(handlers::duplicate_template))
        .route("/templates/apply", post(handlers::apply_template))
        .route(
            "/templates/{template_id}/slots/{slot_id}",
            patch(handlers::update_template_slot),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
    }
}
