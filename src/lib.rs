//! Credit Risk - credit risk assessment service with an AI credit analyst
//!
//! Scores loan applicants with a default-risk predictor and lets them chat
//! with a hosted language model about the result. Session state (last
//! assessment and chat transcript) lives in memory for the session's lifetime.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use self::core::{LogisticPredictor, Predictor, UserDataContext, build_system_prompt};
pub use self::models::{ApplicantInput, RiskAssessment, RiskRating, Speaker, Transcript};
