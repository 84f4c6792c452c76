use crate::models::{ApplicantInput, LoanPurpose, LoanType, ResidenceType};

/// Min/max bounds used to scale a numeric feature into [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Min-max scale, clamped so out-of-range inputs stay in [0, 1]
    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Scaling bounds for each numeric feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    pub age: Bounds,
    pub loan_tenure_months: Bounds,
    pub num_open_accounts: Bounds,
    pub credit_utilization_ratio: Bounds,
    pub loan_to_income: Bounds,
    pub delinquency_ratio: Bounds,
    pub avg_dpd_per_delinquency: Bounds,
}

impl Default for FeatureBounds {
    fn default() -> Self {
        Self {
            age: Bounds::new(18.0, 70.0),
            loan_tenure_months: Bounds::new(6.0, 60.0),
            num_open_accounts: Bounds::new(1.0, 4.0),
            credit_utilization_ratio: Bounds::new(0.0, 99.0),
            loan_to_income: Bounds::new(0.3, 4.6),
            delinquency_ratio: Bounds::new(0.0, 70.0),
            avg_dpd_per_delinquency: Bounds::new(0.0, 40.0),
        }
    }
}

/// Model-ready feature vector
///
/// Numeric features are scaled to [0, 1]; categorical attributes are one-hot
/// encoded with one dropped level each (Mortgage, Auto, Secured).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
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

impl FeatureVector {
    pub fn from_input(input: &ApplicantInput, bounds: &FeatureBounds) -> Self {
        // No income means the loan is as large as it can be relative to it
        let loan_to_income = input
            .loan_to_income_ratio()
            .unwrap_or(bounds.loan_to_income.max);

        Self {
            age: bounds.age.scale(input.age as f64),
            loan_tenure_months: bounds.loan_tenure_months.scale(input.loan_tenure_months as f64),
            num_open_accounts: bounds.num_open_accounts.scale(input.num_open_accounts as f64),
            credit_utilization_ratio: bounds
                .credit_utilization_ratio
                .scale(input.credit_utilization_ratio as f64),
            loan_to_income: bounds.loan_to_income.scale(loan_to_income),
            delinquency_ratio: bounds.delinquency_ratio.scale(input.delinquency_ratio as f64),
            avg_dpd_per_delinquency: bounds
                .avg_dpd_per_delinquency
                .scale(input.avg_dpd_per_delinquency as f64),
            residence_owned: one_hot(input.residence_type == ResidenceType::Owned),
            residence_rented: one_hot(input.residence_type == ResidenceType::Rented),
            purpose_education: one_hot(input.loan_purpose == LoanPurpose::Education),
            purpose_home: one_hot(input.loan_purpose == LoanPurpose::Home),
            purpose_personal: one_hot(input.loan_purpose == LoanPurpose::Personal),
            loan_unsecured: one_hot(input.loan_type == LoanType::Unsecured),
        }
    }
}

#[inline]
fn one_hot(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}
