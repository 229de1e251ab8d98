use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Job {0} is no longer accepting this action")]
    ClosedAuction(Uuid),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Delivery to {recipient} failed: {reason}")]
    Transport { recipient: String, reason: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),
            ServiceError::Conflict(_) | ServiceError::ClosedAuction(_) => {
                HttpError::conflict(error.to_string())
            }
            ServiceError::JobNotFound(_) => HttpError::not_found(error.to_string()),
            ServiceError::StoreUnavailable(_) => {
                HttpError::service_unavailable(ErrorMessage::StoreUnavailable.to_string())
            }
            ServiceError::Transport { .. } => {
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}
