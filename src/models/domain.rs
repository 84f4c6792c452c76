use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Greeting the assistant opens every transcript with
pub const GREETING: &str =
    "Hello! I am your AI Credit Analyst. I can explain your risk assessment and suggest improvements.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResidenceType {
    #[default]
    Owned,
    Rented,
    Mortgage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoanPurpose {
    #[default]
    Education,
    Home,
    Auto,
    Personal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoanType {
    #[default]
    Unsecured,
    Secured,
}

/// Applicant attributes collected by the assessment form
///
/// Bounds mirror the form widgets: percentages are whole numbers in 0..=100
/// and open accounts are limited to 1..=4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApplicantInput {
    #[validate(range(min = 18, max = 100))]
    pub age: u32,
    pub income: u64,
    #[serde(rename = "loanAmount", alias = "loan_amount")]
    pub loan_amount: u64,
    #[serde(rename = "loanTenureMonths", alias = "loan_tenure_months")]
    pub loan_tenure_months: u32,
    #[serde(rename = "avgDpdPerDelinquency", alias = "avg_dpd_per_delinquency")]
    pub avg_dpd_per_delinquency: u32,
    #[validate(range(max = 100))]
    #[serde(rename = "delinquencyRatio", alias = "delinquency_ratio")]
    pub delinquency_ratio: u32,
    #[validate(range(max = 100))]
    #[serde(rename = "creditUtilizationRatio", alias = "credit_utilization_ratio")]
    pub credit_utilization_ratio: u32,
    #[validate(range(min = 1, max = 4))]
    #[serde(rename = "numOpenAccounts", alias = "num_open_accounts")]
    pub num_open_accounts: u32,
    #[serde(rename = "residenceType", alias = "residence_type")]
    pub residence_type: ResidenceType,
    #[serde(rename = "loanPurpose", alias = "loan_purpose")]
    pub loan_purpose: LoanPurpose,
    #[serde(rename = "loanType", alias = "loan_type")]
    pub loan_type: LoanType,
}

impl Default for ApplicantInput {
    fn default() -> Self {
        Self {
            age: 28,
            income: 1_200_000,
            loan_amount: 2_560_000,
            loan_tenure_months: 36,
            avg_dpd_per_delinquency: 20,
            delinquency_ratio: 30,
            credit_utilization_ratio: 30,
            num_open_accounts: 2,
            residence_type: ResidenceType::Owned,
            loan_purpose: LoanPurpose::Education,
            loan_type: LoanType::Unsecured,
        }
    }
}

impl ApplicantInput {
    pub fn monthly_income(&self) -> u64 {
        self.income / 12
    }

    /// Loan amount over annual income, undefined without income
    pub fn loan_to_income_ratio(&self) -> Option<f64> {
        if self.income == 0 {
            return None;
        }
        Some(self.loan_amount as f64 / self.income as f64)
    }

    /// Ratio clamped to a progress-bar fraction
    pub fn loan_to_income_progress(&self) -> Option<f64> {
        self.loan_to_income_ratio().map(|r| r.clamp(0.0, 1.0))
    }
}

/// Risk rating band derived from the credit score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskRating {
    Poor,
    Average,
    Good,
    Excellent,
}

impl RiskRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 750 => RiskRating::Excellent,
            s if s >= 650 => RiskRating::Good,
            s if s >= 500 => RiskRating::Average,
            _ => RiskRating::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Poor => "Poor",
            RiskRating::Average => "Average",
            RiskRating::Good => "Good",
            RiskRating::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for RiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predictor output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub probability: f64,
    #[serde(rename = "creditScore")]
    pub credit_score: u32,
    pub rating: RiskRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    You,
    Bot,
}

impl Speaker {
    /// Chat role used when rendering the turn
    pub fn role(&self) -> &'static str {
        match self {
            Speaker::You => "user",
            Speaker::Bot => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub message: String,
}

/// Ordered speaker/message pairs for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::with_greeting()
    }
}

impl Transcript {
    pub fn empty() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn with_greeting() -> Self {
        let mut transcript = Self::empty();
        transcript.push(Speaker::Bot, GREETING);
        transcript
    }

    pub fn push(&mut self, speaker: Speaker, message: impl Into<String>) {
        self.turns.push(ChatTurn {
            speaker,
            message: message.into(),
        });
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
