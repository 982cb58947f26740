//! Contains all the routes that this application can handle.

mod api;

// re-export errors
pub use api::submit_form::SubmitFormError;

use crate::AppState;

use axum::{
    http::StatusCode,
    routing::{any, get},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/api" path
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        // Every method is routed here, the handler answers non-POST requests itself.
        .route("/submit-form", any(api::submit_form))
        .with_state(app_state)
}
