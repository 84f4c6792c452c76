use crate::models::{ApplicantInput, RiskAssessment};
use serde::Serialize;
use std::fmt;

/// Scoring context embedded into the system prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDataContext {
    pub credit_score: String,
    pub risk_rating: String,
    pub probability_of_default: String,
    pub utilization_ratio: String,
    pub days_past_due: u32,
    pub delinquency_ratio: String,
    pub loan_amount: u64,
    pub income: u64,
}

impl UserDataContext {
    /// Build the context from the last assessment (if any) and the current form
    pub fn new(assessment: Option<&RiskAssessment>, input: &ApplicantInput) -> Self {
        Self {
            credit_score: assessment
                .map(|a| a.credit_score.to_string())
                .unwrap_or_else(|| "not calculated yet".to_string()),
            risk_rating: assessment
                .map(|a| a.rating.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            probability_of_default: assessment
                .map(|a| format_percent(a.probability))
                .unwrap_or_else(|| "N/A".to_string()),
            utilization_ratio: format!("{}%", input.credit_utilization_ratio),
            days_past_due: input.avg_dpd_per_delinquency,
            delinquency_ratio: format!("{}%", input.delinquency_ratio),
            loan_amount: input.loan_amount,
            income: input.income,
        }
    }
}

impl fmt::Display for UserDataContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- credit_score: {}", self.credit_score)?;
        writeln!(f, "- risk_rating: {}", self.risk_rating)?;
        writeln!(f, "- probability_of_default: {}", self.probability_of_default)?;
        writeln!(f, "- utilization_ratio: {}", self.utilization_ratio)?;
        writeln!(f, "- days_past_due: {}", self.days_past_due)?;
        writeln!(f, "- delinquency_ratio: {}", self.delinquency_ratio)?;
        writeln!(f, "- loan_amount: {}", self.loan_amount)?;
        write!(f, "- income: {}", self.income)
    }
}

/// Render a probability as a percentage with two decimals, e.g. `38.21%`
pub fn format_percent(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Build the analyst system prompt around the user's scoring context
pub fn build_system_prompt(context: &UserDataContext) -> String {
    format!(
        "You are an expert Credit Risk Analyst.

USER DATA:
{context}

INSTRUCTIONS:
1. **Conversational Mode**:
   - IF the user says \"Hello\", \"Thanks\", \"Bye\", \"Exit\", \"Help\", or similar social triggers:
   - Respond naturally, politely, and briefly (1-2 sentences).
   - DO NOT use the strict Analysis/Tips format for these.

2. **Analyst Mode** (For credit/finance questions):
   - IF the user asks about scores, money, improvement, or risk:
   - Follow the CRITICAL FORMATTING RULES below.

CRITICAL FORMATTING RULES (For Analyst Mode only):
1. DO NOT use LaTeX formatting (no dollar signs like $ or $$ for math/currency). Use plain text (e.g., \"INR 50,000\" or \"Rs.\").
2. Keep the response SHORT and readable.
3. Structure your answer EXACTLY as follows:
   - **Analysis**: 3-4 bullet points explaining the situation.
   - **Tips**: 2-3 actionable tips to improve.
4. Do not exceed these limits."
    )
}
