use crate::core::features::{FeatureBounds, FeatureVector};
use crate::models::{ApplicantInput, RiskAssessment, RiskRating};

/// Lowest and highest credit scores the predictor can produce
pub const MIN_SCORE: u32 = 300;
pub const MAX_SCORE: u32 = 900;

/// Default-risk predictor
///
/// Maps applicant attributes to a default probability, a credit score and a
/// rating. Implementations must return a probability in [0, 1].
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &ApplicantInput) -> RiskAssessment;
}

/// Logistic regression coefficients, one per feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelCoefficients {
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

impl Default for ModelCoefficients {
    fn default() -> Self {
        Self {
            intercept: -6.5,
            age: -1.5,
            loan_tenure_months: 1.0,
            num_open_accounts: 0.6,
            credit_utilization_ratio: 1.6,
            loan_to_income: 3.5,
            delinquency_ratio: 5.5,
            avg_dpd_per_delinquency: 3.0,
            residence_owned: -0.4,
            residence_rented: 0.3,
            purpose_education: -0.3,
            purpose_home: 0.4,
            purpose_personal: 0.2,
            loan_unsecured: 0.4,
        }
    }
}

impl ModelCoefficients {
    #[inline]
    fn logit(&self, x: &FeatureVector) -> f64 {
        self.intercept
            + self.age * x.age
            + self.loan_tenure_months * x.loan_tenure_months
            + self.num_open_accounts * x.num_open_accounts
            + self.credit_utilization_ratio * x.credit_utilization_ratio
            + self.loan_to_income * x.loan_to_income
            + self.delinquency_ratio * x.delinquency_ratio
            + self.avg_dpd_per_delinquency * x.avg_dpd_per_delinquency
            + self.residence_owned * x.residence_owned
            + self.residence_rented * x.residence_rented
            + self.purpose_education * x.purpose_education
            + self.purpose_home * x.purpose_home
            + self.purpose_personal * x.purpose_personal
            + self.loan_unsecured * x.loan_unsecured
    }
}

/// Coefficient-driven logistic predictor
///
/// # Pipeline
/// 1. Scale and one-hot encode the input
/// 2. probability = sigmoid(intercept + Σ wᵢ·xᵢ)
/// 3. score = 300 + (1 - probability) * 600
/// 4. rating from score band
#[derive(Debug, Clone)]
pub struct LogisticPredictor {
    coefficients: ModelCoefficients,
    bounds: FeatureBounds,
}

impl LogisticPredictor {
    pub fn new(coefficients: ModelCoefficients, bounds: FeatureBounds) -> Self {
        Self {
            coefficients,
            bounds,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ModelCoefficients::default(), FeatureBounds::default())
    }

    pub fn probability(&self, input: &ApplicantInput) -> f64 {
        let features = FeatureVector::from_input(input, &self.bounds);
        let p = sigmoid(self.coefficients.logit(&features));
        // NaN coefficients would otherwise leak out of [0, 1]
        if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) }
    }
}

impl Default for LogisticPredictor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Predictor for LogisticPredictor {
    fn predict(&self, input: &ApplicantInput) -> RiskAssessment {
        let probability = self.probability(input);
        let credit_score = credit_score(probability);

        tracing::debug!(
            "Predicted probability={:.4} score={} for age={} income={}",
            probability,
            credit_score,
            input.age,
            input.income
        );

        RiskAssessment {
            probability,
            credit_score,
            rating: RiskRating::from_score(credit_score),
        }
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Map a default probability to a score in 300..=900
#[inline]
pub fn credit_score(probability: f64) -> u32 {
    let span = (MAX_SCORE - MIN_SCORE) as f64;
    let score = MIN_SCORE as f64 + (1.0 - probability.clamp(0.0, 1.0)) * span;
    score.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanPurpose, LoanType, ResidenceType};

    #[test]
    fn test_credit_score_bounds() {
        assert_eq!(credit_score(0.0), 900);
        assert_eq!(credit_score(1.0), 300);
        assert_eq!(credit_score(0.5), 600);
    }

    #[test]
    fn test_default_input_prediction() {
        let predictor = LogisticPredictor::with_defaults();
        let result = predictor.predict(&ApplicantInput::default());

        assert!(result.probability > 0.0 && result.probability < 1.0);
        assert!((MIN_SCORE..=MAX_SCORE).contains(&result.credit_score));
        assert_eq!(result.rating, RiskRating::from_score(result.credit_score));
    }

    #[test]
    fn test_clean_history_scores_excellent() {
        let predictor = LogisticPredictor::with_defaults();
        let input = ApplicantInput {
            age: 45,
            income: 3_000_000,
            loan_amount: 900_000,
            loan_tenure_months: 12,
            avg_dpd_per_delinquency: 0,
            delinquency_ratio: 0,
            credit_utilization_ratio: 5,
            num_open_accounts: 1,
            residence_type: ResidenceType::Owned,
            loan_purpose: LoanPurpose::Education,
            loan_type: LoanType::Secured,
        };
        let result = predictor.predict(&input);

        assert!(result.probability < 0.05);
        assert_eq!(result.rating, RiskRating::Excellent);
    }

    #[test]
    fn test_delinquency_raises_risk() {
        let predictor = LogisticPredictor::with_defaults();
        let low = ApplicantInput { delinquency_ratio: 5, ..Default::default() };
        let high = ApplicantInput { delinquency_ratio: 60, ..Default::default() };

        let low = predictor.predict(&low);
        let high = predictor.predict(&high);

        assert!(high.probability > low.probability);
        assert!(high.credit_score < low.credit_score);
    }

    #[test]
    fn test_extreme_coefficients_stay_in_range() {
        let coefficients = ModelCoefficients {
            intercept: 1.0e6,
            ..Default::default()
        };
        let predictor = LogisticPredictor::new(coefficients, FeatureBounds::default());
        let result = predictor.predict(&ApplicantInput::default());

        assert_eq!(result.probability, 1.0);
        assert_eq!(result.credit_score, MIN_SCORE);
        assert_eq!(result.rating, RiskRating::Poor);
    }
}
