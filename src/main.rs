use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use credit_risk::config::Settings;
use credit_risk::core::{FeatureBounds, LogisticPredictor, ModelCoefficients};
use credit_risk::routes::{self, AppState};
use credit_risk::services::{ChatClient, CredentialStore, SessionStore};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn to_io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the file can set the defaults
    let settings = Settings::load();
    let logging = settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default();

    // Initialize logging
    let log_level = std::env::var("LOG_LEVEL").unwrap_or(logging.level);
    let log_format = std::env::var("LOG_FORMAT").unwrap_or(logging.format);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting credit risk service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        to_io_error(format!("Configuration error: {}", e))
    })?;

    info!("Configuration loaded successfully");

    let coefficients = ModelCoefficients::from(&settings.predictor.coefficients);
    let predictor = Arc::new(LogisticPredictor::new(coefficients, FeatureBounds::default()));

    info!("Predictor initialized with coefficients: {:?}", coefficients);

    let credentials = Arc::new(CredentialStore::load(
        &settings.chat.secrets_path,
        &settings.chat.api_key_env,
    ));

    let chat = Arc::new(
        ChatClient::new(
            settings.chat.base_url.clone(),
            settings.chat.temperature,
            settings.chat.max_tokens,
            settings.chat.timeout_secs,
        )
        .map_err(|e| {
            error!("Failed to create chat client: {}", e);
            to_io_error(e)
        })?,
    );

    info!("Chat client initialized for {}", settings.chat.base_url);

    let sessions = Arc::new(SessionStore::new(
        settings.session.max_sessions,
        settings.session.ttl_secs,
    ));

    info!(
        "Session store initialized (capacity: {}, idle TTL: {}s)",
        settings.session.max_sessions, settings.session.ttl_secs
    );

    // Build application state
    let app_state = AppState {
        predictor,
        sessions,
        chat,
        chat_settings: Arc::new(settings.chat.clone()),
        credentials,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
