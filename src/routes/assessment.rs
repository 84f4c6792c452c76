use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use validator::Validate;
use crate::core::format_percent;
use crate::models::{
    AiSettingsResponse, ApiKeyRequest, AssessRequest, AssessmentResponse, FormSummary,
    HealthResponse, SessionResponse, TranscriptResponse,
};
use crate::routes::{error_response, session_error_response, AppState};

const ASSESSMENT_TIP: &str = "Tip: Ask the credit assistant for advice on improving this score.";

/// Configure session and assessment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/settings", web::get().to(ai_settings))
        .route("/sessions", web::post().to(create_session))
        .route("/sessions/{session_id}", web::get().to(get_session))
        .route("/sessions/{session_id}/assess", web::post().to(assess))
        .route("/sessions/{session_id}/transcript", web::get().to(get_transcript))
        .route("/sessions/{session_id}/api-key", web::post().to(set_api_key));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    tracing::trace!("Health check with {} active sessions", state.sessions.session_count());

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

#[derive(Debug, Deserialize)]
struct SettingsQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// AI settings panel
///
/// GET /api/v1/settings?sessionId={sessionId}
///
/// Reports whether chat is available and where the key came from. With a
/// session id, a key supplied for that session is taken into account.
async fn ai_settings(
    state: web::Data<AppState>,
    query: web::Query<SettingsQuery>,
) -> impl Responder {
    let session_key = match &query.session_id {
        Some(id) => match state.sessions.get(id).await {
            Ok(session) => session.api_key,
            Err(e) => return session_error_response(e),
        },
        None => None,
    };

    let credential = state.credentials.resolve(session_key.as_deref());

    HttpResponse::Ok().json(AiSettingsResponse {
        chat_enabled: credential.is_some(),
        credential_source: credential.map(|c| c.source()),
        status: state.credentials.status_message(session_key.as_deref()),
        models: state.chat_settings.models.clone(),
        default_model: state.chat_settings.default_model().to_string(),
    })
}

/// Create a session
///
/// POST /api/v1/sessions
async fn create_session(state: web::Data<AppState>) -> impl Responder {
    let session_id = state.sessions.create().await;
    tracing::info!("Created session {}", session_id);

    match state.sessions.get(&session_id).await {
        Ok(session) => HttpResponse::Created().json(SessionResponse {
            session_id,
            last_input: session.last_input,
            last_assessment: session.last_assessment,
            transcript: session.transcript.turns().to_vec(),
            has_session_key: session.api_key.is_some(),
        }),
        Err(e) => session_error_response(e),
    }
}

async fn get_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match state.sessions.get(&session_id).await {
        Ok(session) => HttpResponse::Ok().json(SessionResponse {
            session_id,
            last_input: session.last_input,
            last_assessment: session.last_assessment,
            transcript: session.transcript.turns().to_vec(),
            has_session_key: session.api_key.is_some(),
        }),
        Err(e) => session_error_response(e),
    }
}

/// Run a risk assessment
///
/// POST /api/v1/sessions/{sessionId}/assess
///
/// Request body (every field optional, defaults shown):
/// ```json
/// {
///   "age": 28,
///   "income": 1200000,
///   "loanAmount": 2560000,
///   "loanTenureMonths": 36,
///   "avgDpdPerDelinquency": 20,
///   "delinquencyRatio": 30,
///   "creditUtilizationRatio": 30,
///   "numOpenAccounts": 2,
///   "residenceType": "Owned",
///   "loanPurpose": "Education",
///   "loanType": "Unsecured"
/// }
/// ```
async fn assess(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<AssessRequest>,
) -> impl Responder {
    let session_id = path.into_inner();

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for assessment in session {}: {:?}", session_id, errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let input = req.into_inner();
    let assessment = state.predictor.predict(&input);

    if let Err(e) = state
        .sessions
        .record_assessment(&session_id, input.clone(), assessment)
        .await
    {
        return session_error_response(e);
    }

    tracing::info!(
        "Assessment for session {}: probability={:.4}, score={}, rating={}",
        session_id,
        assessment.probability,
        assessment.credit_score,
        assessment.rating
    );

    HttpResponse::Ok().json(AssessmentResponse {
        probability: assessment.probability,
        probability_display: format_percent(assessment.probability),
        credit_score: assessment.credit_score,
        rating: assessment.rating,
        summary: FormSummary::from(&input),
        tip: ASSESSMENT_TIP.to_string(),
    })
}

async fn get_transcript(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match state.sessions.get(&session_id).await {
        Ok(session) => HttpResponse::Ok().json(TranscriptResponse {
            session_id,
            turns: session.transcript.turns().to_vec(),
        }),
        Err(e) => session_error_response(e),
    }
}

/// Supply an API key for this session only
///
/// POST /api/v1/sessions/{sessionId}/api-key
async fn set_api_key(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ApiKeyRequest>,
) -> impl Responder {
    let session_id = path.into_inner();

    let key = req.api_key.trim().to_string();
    if key.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", "apiKey must not be empty");
    }

    let status = state.credentials.status_message(Some(&key));
    if let Err(e) = state.sessions.set_api_key(&session_id, key).await {
        return session_error_response(e);
    }

    tracing::info!("Session {} supplied its own API key", session_id);

    HttpResponse::Ok().json(serde_json::json!({
        "sessionId": session_id,
        "chatEnabled": true,
        "status": status,
    }))
}
