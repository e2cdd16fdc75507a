pub mod handlers;

pub use handlers::*;

use crate::service::IngestService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// All routes of the service
pub fn create_router(service: Arc<IngestService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/promob/process", post(process_promob_file))
        .route("/api/budgets/:id", get(get_budget))
        .route("/api/budgets/:id/items.csv", get(export_budget_items))
        .with_state(service)
}
