use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    let insights = Router::new()
        .route("/", get(handlers::list_insights))
        .route("/relevant", get(handlers::relevant_insights))
        .route("/category/:category", get(handlers::insights_by_category))
        .route("/summary/daily", get(handlers::daily_summary))
        .route("/collect", post(handlers::collect))
        .route("/pipeline", post(handlers::run_pipeline))
        .route("/stats", get(handlers::system_stats))
        .route("/test-model", get(handlers::model_check));

    Router::new()
        .nest("/api/insights", insights)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState};
    pub use ins_core::{Error, Result};
}
