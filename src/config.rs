use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::core::ModelCoefficients;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub predictor: PredictorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            models: default_models(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            secrets_path: default_secrets_path(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl ChatSettings {
    /// First configured model, used when a request names none
    pub fn default_model(&self) -> &str {
        self.models
            .first()
            .map(String::as_str)
            .unwrap_or("llama-3.1-8b-instant")
    }

    /// Resolve a requested model against the allowed list
    pub fn select_model(&self, requested: Option<&str>) -> Option<String> {
        match requested.map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) => self.models.iter().find(|m| m.as_str() == model).cloned(),
            None => Some(self.default_model().to_string()),
        }
    }
}

fn default_base_url() -> String { "https://api.groq.com/openai/v1".to_string() }
fn default_models() -> Vec<String> {
    vec![
        "llama-3.1-8b-instant".to_string(),
        "llama-3.3-70b-versatile".to_string(),
        "mixtral-8x7b-32768".to_string(),
    ]
}
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 512 }
fn default_timeout_secs() -> u64 { 60 }
fn default_secrets_path() -> PathBuf { PathBuf::from("config/secrets.toml") }
fn default_api_key_env() -> String { "API_KEY".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_session_ttl() -> u64 { 3600 }
fn default_max_sessions() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PredictorSettings {
    #[serde(default)]
    pub coefficients: CoefficientsConfig,
}

/// Logistic coefficients; any field left out keeps its default
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoefficientsConfig {
    pub intercept: f64,
    pub age: f64,
    pub loan_tenure_months: f64,
    pub num_open_accounts: f64,
    pub credit_utilization_ratio: f64,
    pub loan_to_income: f64,
    pub delinquency_ratio: f64,
    pub avg_dpd_per_delinquency: f64,
    pub residence_owned: f64,
    pub residence_rented: f64,
    pub purpose_education: f64,
    pub purpose_home: f64,
    pub purpose_personal: f64,
    pub loan_unsecured: f64,
}

impl Default for CoefficientsConfig {
    fn default() -> Self {
        let c = ModelCoefficients::default();
        Self {
            intercept: c.intercept,
            age: c.age,
            loan_tenure_months: c.loan_tenure_months,
            num_open_accounts: c.num_open_accounts,
            credit_utilization_ratio: c.credit_utilization_ratio,
            loan_to_income: c.loan_to_income,
            delinquency_ratio: c.delinquency_ratio,
            avg_dpd_per_delinquency: c.avg_dpd_per_delinquency,
            residence_owned: c.residence_owned,
            residence_rented: c.residence_rented,
            purpose_education: c.purpose_education,
            purpose_home: c.purpose_home,
            purpose_personal: c.purpose_personal,
            loan_unsecured: c.loan_unsecured,
        }
    }
}

impl From<&CoefficientsConfig> for ModelCoefficients {
    fn from(c: &CoefficientsConfig) -> Self {
        Self {
            intercept: c.intercept,
            age: c.age,
            loan_tenure_months: c.loan_tenure_months,
            num_open_accounts: c.num_open_accounts,
            credit_utilization_ratio: c.credit_utilization_ratio,
            loan_to_income: c.loan_to_income,
            delinquency_ratio: c.delinquency_ratio,
            avg_dpd_per_delinquency: c.avg_dpd_per_delinquency,
            residence_owned: c.residence_owned,
            residence_rented: c.residence_rented,
            purpose_education: c.purpose_education,
            purpose_home: c.purpose_home,
            purpose_personal: c.purpose_personal,
            loan_unsecured: c.loan_unsecured,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CREDIT_)
    /// 5. Plain HOST / PORT variables set by container platforms
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CREDIT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CREDIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_platform_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CREDIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Honour the bare HOST and PORT variables most hosting platforms inject
fn apply_platform_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(host) = env::var("HOST") {
        builder = builder.set_override("server.host", host)?;
    }
    if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
        builder = builder.set_override("server.port", port as i64)?;
    }

    builder.build()
}
