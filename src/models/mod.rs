// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ApplicantInput, ChatTurn, LoanPurpose, LoanType, ResidenceType, RiskAssessment, RiskRating,
    Speaker, Transcript, GREETING,
};
pub use requests::{ApiKeyRequest, AssessRequest, ChatRequest};
pub use responses::{
    AiSettingsResponse, AssessmentResponse, ErrorResponse, FormSummary, HealthResponse,
    SessionResponse, TranscriptResponse,
};
