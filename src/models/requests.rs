use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::models::domain::ApplicantInput as AssessRequest;

/// Request to send a chat message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Request to supply an API key for a single session
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiKeyRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "api_key", rename = "apiKey")]
    pub api_key: String,
}
