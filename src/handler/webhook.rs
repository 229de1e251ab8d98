// handler/webhook.rs
use std::sync::Arc;

use axum::{
    extract::rejection::FormRejection,
    http::header,
    response::IntoResponse,
    routing::post,
    Extension, Form, Router,
};
use validator::Validate;

use crate::{
    dtos::messagedtos::InboundMessageDto,
    service::{error::ServiceError, prompts},
    utils::input::bare_phone,
    AppState,
};

const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

pub fn whatsapp_handler() -> Router {
    Router::new().route("/whatsapp", post(inbound_message))
}

/// Always acknowledges with `200`; outcomes reach the sender as outbound
/// messages, never over this response.
pub async fn inbound_message(
    Extension(app_state): Extension<Arc<AppState>>,
    form: Result<Form<InboundMessageDto>, FormRejection>,
) -> impl IntoResponse {
    let body = match form {
        Ok(Form(body)) => body,
        Err(rejection) => {
            tracing::warn!("Dropping malformed inbound message: {}", rejection);
            return twiml();
        }
    };

    if let Err(e) = body.validate() {
        tracing::warn!("Dropping inbound message without sender: {}", e);
        return twiml();
    }

    match app_state
        .conversation_service
        .handle_inbound(&body.from, &body.body)
        .await
    {
        Ok(()) => {}
        Err(ServiceError::StoreUnavailable(e)) => {
            tracing::error!("Store unavailable while handling message from {}: {}", body.from, e);
            app_state
                .notification_service
                .reply(&bare_phone(&body.from), prompts::system_error())
                .await;
        }
        Err(e) => {
            tracing::error!("Unhandled error for message from {}: {}", body.from, e);
        }
    }

    twiml()
}

fn twiml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml")], EMPTY_TWIML)
}
