use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use futures_util::{stream, StreamExt};
use tokio::sync::mpsc;
use validator::Validate;
use crate::core::{build_system_prompt, UserDataContext};
use crate::models::{ChatRequest, Speaker};
use crate::routes::{error_response, session_error_response, AppState};
use crate::services::{SessionStore, TokenStream};
use std::sync::Arc;

const MISSING_KEY_MESSAGE: &str = "Please add your Groq API Key to proceed.";

/// Configure chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/sessions/{session_id}/chat", web::post().to(chat));
}

/// Send a message to the credit assistant
///
/// POST /api/v1/sessions/{sessionId}/chat
///
/// Request body:
/// ```json
/// {
///   "message": "How do I improve?",
///   "model": "llama-3.1-8b-instant"
/// }
/// ```
///
/// The reply streams back as plain text. Without an API key the request is
/// refused before anything is recorded or sent upstream.
async fn chat(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ChatRequest>,
) -> impl Responder {
    let session_id = path.into_inner();

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let session = match state.sessions.get(&session_id).await {
        Ok(session) => session,
        Err(e) => return session_error_response(e),
    };

    let Some(credential) = state.credentials.resolve(session.api_key.as_deref()) else {
        tracing::warn!("Chat refused for session {}: no API key available", session_id);
        return error_response(StatusCode::FORBIDDEN, "API key required", MISSING_KEY_MESSAGE);
    };

    let Some(model) = state.chat_settings.select_model(req.model.as_deref()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Unknown model",
            format!("Model must be one of: {}", state.chat_settings.models.join(", ")),
        );
    };

    let session = match state.sessions.begin_exchange(&session_id, &req.message).await {
        Ok(session) => session,
        Err(e) => return session_error_response(e),
    };

    let context = UserDataContext::new(session.last_assessment.as_ref(), &session.current_input());
    let system_prompt = build_system_prompt(&context);

    tracing::info!(
        "Chat request for session {} using {} (key from {:?})",
        session_id,
        model,
        credential.source()
    );

    let tokens = match state
        .chat
        .stream_completion(credential.key(), &model, &system_prompt, &req.message)
        .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("Chat completion failed for session {}: {}", session_id, e);
            return error_response(StatusCode::BAD_GATEWAY, "API Error", format!("API Error: {}", e));
        }
    };

    let (tx, rx) = mpsc::channel::<web::Bytes>(32);
    tokio::spawn(relay_reply(tokens, tx, state.sessions.clone(), session_id));

    let body = stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|bytes| (Ok::<_, std::io::Error>(bytes), rx))
    });

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .streaming(body)
}

/// Forward tokens to the client and record the full reply once it completes
///
/// The upstream stream is drained even if the client goes away so the
/// transcript still gets the reply. A failed stream leaves no Bot turn.
async fn relay_reply(
    mut tokens: TokenStream,
    tx: mpsc::Sender<web::Bytes>,
    sessions: Arc<SessionStore>,
    session_id: String,
) {
    let mut reply = String::new();

    while let Some(token) = tokens.next().await {
        match token {
            Ok(token) => {
                reply.push_str(&token);
                let _ = tx.send(web::Bytes::from(token)).await;
            }
            Err(e) => {
                tracing::error!("Chat stream failed for session {}: {}", session_id, e);
                let _ = tx.send(web::Bytes::from(format!("\n\nAPI Error: {}", e))).await;
                return;
            }
        }
    }

    if let Err(e) = sessions.append_turn(&session_id, Speaker::Bot, reply).await {
        tracing::warn!("Could not record reply for session {}: {}", session_id, e);
    }
    // Dropping tx ends the response body
}
