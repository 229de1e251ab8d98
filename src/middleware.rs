use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::IntoResponse, Extension};
use subtle::ConstantTimeEq;

use crate::{
    error::{ErrorMessage, HttpError},
    AppState,
};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

pub async fn require_cron_secret(
    Extension(app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let provided = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::SecretNotProvided.to_string()))?;

    let matches: bool = provided
        .as_bytes()
        .ct_eq(app_state.env.cron_secret.as_bytes())
        .into();

    if !matches {
        tracing::warn!("Rejected sweep trigger with invalid secret");
        return Err(HttpError::unauthorized(ErrorMessage::InvalidSecret.to_string()));
    }

    Ok(next.run(req).await)
}
