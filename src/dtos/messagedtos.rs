use serde::{Deserialize, Serialize};
use validator::Validate;

/// Form fields posted by the messaging provider for every inbound message.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct InboundMessageDto {
    #[serde(rename = "From", default)]
    #[validate(length(min = 1, message = "Sender is required"))]
    pub from: String,

    #[serde(rename = "Body", default)]
    pub body: String,
}

//Response wrappers
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
