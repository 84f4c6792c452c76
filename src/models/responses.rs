use serde::{Deserialize, Serialize};
use crate::models::domain::{ApplicantInput, ChatTurn, RiskAssessment, RiskRating};
use crate::services::CredentialSource;

/// Session snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "lastInput")]
    pub last_input: Option<ApplicantInput>,
    #[serde(rename = "lastAssessment")]
    pub last_assessment: Option<RiskAssessment>,
    pub transcript: Vec<ChatTurn>,
    #[serde(rename = "hasSessionKey")]
    pub has_session_key: bool,
}

/// Figures shown alongside the form inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSummary {
    #[serde(rename = "monthlyIncome")]
    pub monthly_income: u64,
    #[serde(rename = "loanToIncomeRatio")]
    pub loan_to_income_ratio: Option<f64>,
    #[serde(rename = "loanToIncomeProgress")]
    pub loan_to_income_progress: Option<f64>,
}

impl From<&ApplicantInput> for FormSummary {
    fn from(input: &ApplicantInput) -> Self {
        Self {
            monthly_income: input.monthly_income(),
            loan_to_income_ratio: input.loan_to_income_ratio(),
            loan_to_income_progress: input.loan_to_income_progress(),
        }
    }
}

/// Response for the assessment endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub probability: f64,
    #[serde(rename = "probabilityDisplay")]
    pub probability_display: String,
    #[serde(rename = "creditScore")]
    pub credit_score: u32,
    pub rating: RiskRating,
    pub summary: FormSummary,
    pub tip: String,
}

/// Transcript response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
}

/// AI settings panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettingsResponse {
    #[serde(rename = "chatEnabled")]
    pub chat_enabled: bool,
    #[serde(rename = "credentialSource")]
    pub credential_source: Option<CredentialSource>,
    pub status: String,
    pub models: Vec<String>,
    #[serde(rename = "defaultModel")]
    pub default_model: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
