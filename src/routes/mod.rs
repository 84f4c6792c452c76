// Route exports
pub mod assessment;
pub mod chat;

use actix_web::{web, HttpResponse};
use crate::config::ChatSettings;
use crate::core::Predictor;
use crate::models::ErrorResponse;
use crate::services::{ChatClient, CredentialStore, SessionError, SessionStore};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn Predictor>,
    pub sessions: Arc<SessionStore>,
    pub chat: Arc<ChatClient>,
    pub chat_settings: Arc<ChatSettings>,
    pub credentials: Arc<CredentialStore>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(assessment::configure)
            .configure(chat::configure),
    );
}

pub(crate) fn error_response(status: actix_web::http::StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn session_error_response(err: SessionError) -> HttpResponse {
    match err {
        SessionError::NotFound(_) => {
            error_response(actix_web::http::StatusCode::NOT_FOUND, "Session not found", err.to_string())
        }
    }
}
