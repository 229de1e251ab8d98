// handler/sweeper.rs
use std::sync::Arc;

use axum::{middleware, response::IntoResponse, routing::post, Extension, Json, Router};

use crate::{dtos::messagedtos::ApiResponse, error::HttpError, middleware::require_cron_secret, AppState};

pub fn sweeper_handler() -> Router {
    Router::new()
        .route("/sweep", post(run_sweep))
        .layer(middleware::from_fn(require_cron_secret))
}

pub async fn run_sweep(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let report = app_state.sweeper_service.sweep().await?;
    Ok(Json(ApiResponse::success("Sweep completed", report)))
}
