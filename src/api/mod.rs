pub mod health;
pub mod plans;

use crate::orchestration::LeveragePlanner;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<LeveragePlanner>,
}

impl AppState {
    pub fn new(planner: Arc<LeveragePlanner>) -> Self {
        Self { planner }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/plans/open", post(plans::plan_open))
        .route("/v1/plans/close", post(plans::plan_close))
        .layer(cors)
        .with_state(state)
}
