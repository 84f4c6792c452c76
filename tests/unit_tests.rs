// Unit tests for Credit Risk

use credit_risk::core::{
    build_system_prompt, credit_score, format_percent,
    features::{FeatureBounds, FeatureVector},
    predictor::{LogisticPredictor, Predictor, MAX_SCORE, MIN_SCORE},
    UserDataContext,
};
use credit_risk::models::{
    ApplicantInput, LoanPurpose, LoanType, ResidenceType, RiskAssessment, RiskRating,
};
use validator::Validate;

fn all_categories() -> Vec<(ResidenceType, LoanPurpose, LoanType)> {
    let mut combos = Vec::new();
    for residence in [ResidenceType::Owned, ResidenceType::Rented, ResidenceType::Mortgage] {
        for purpose in [LoanPurpose::Education, LoanPurpose::Home, LoanPurpose::Auto, LoanPurpose::Personal] {
            for loan_type in [LoanType::Unsecured, LoanType::Secured] {
                combos.push((residence, purpose, loan_type));
            }
        }
    }
    combos
}

#[test]
fn test_predictor_output_in_range_for_valid_inputs() {
    let predictor = LogisticPredictor::with_defaults();

    for (residence_type, loan_purpose, loan_type) in all_categories() {
        for age in [18, 35, 100] {
            for income in [0, 250_000, 10_000_000] {
                for ratio in [0, 50, 100] {
                    for num_open_accounts in 1..=4 {
                        let input = ApplicantInput {
                            age,
                            income,
                            loan_amount: 5_000_000,
                            loan_tenure_months: 240,
                            avg_dpd_per_delinquency: 90,
                            delinquency_ratio: ratio,
                            credit_utilization_ratio: ratio,
                            num_open_accounts,
                            residence_type,
                            loan_purpose,
                            loan_type,
                        };
                        assert!(input.validate().is_ok());

                        let result = predictor.predict(&input);
                        assert!(
                            (0.0..=1.0).contains(&result.probability),
                            "Probability {} out of range for {:?}",
                            result.probability,
                            input
                        );
                        assert!((MIN_SCORE..=MAX_SCORE).contains(&result.credit_score));
                        assert_eq!(result.rating, RiskRating::from_score(result.credit_score));
                    }
                }
            }
        }
    }
}

#[test]
fn test_predictor_is_deterministic() {
    let predictor = LogisticPredictor::with_defaults();
    let input = ApplicantInput::default();
    assert_eq!(predictor.predict(&input), predictor.predict(&input));
}

#[test]
fn test_higher_utilization_lowers_score() {
    let predictor = LogisticPredictor::with_defaults();
    let low = predictor.predict(&ApplicantInput { credit_utilization_ratio: 10, ..Default::default() });
    let high = predictor.predict(&ApplicantInput { credit_utilization_ratio: 90, ..Default::default() });
    assert!(high.credit_score <= low.credit_score);
    assert!(high.probability > low.probability);
}

#[test]
fn test_credit_score_monotonic() {
    let mut previous = credit_score(0.0);
    for step in 1..=100 {
        let score = credit_score(step as f64 / 100.0);
        assert!(score <= previous);
        previous = score;
    }
    assert_eq!(previous, MIN_SCORE);
}

#[test]
fn test_feature_vector_is_scaled() {
    let input = ApplicantInput {
        age: 100,
        loan_tenure_months: 600,
        avg_dpd_per_delinquency: 365,
        ..Default::default()
    };
    let features = FeatureVector::from_input(&input, &FeatureBounds::default());

    for value in [
        features.age,
        features.loan_tenure_months,
        features.num_open_accounts,
        features.credit_utilization_ratio,
        features.loan_to_income,
        features.delinquency_ratio,
        features.avg_dpd_per_delinquency,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }
    assert_eq!(features.age, 1.0);
    assert_eq!(features.avg_dpd_per_delinquency, 1.0);
}

#[test]
fn test_prompt_uses_current_form_values() {
    let input = ApplicantInput {
        credit_utilization_ratio: 72,
        delinquency_ratio: 15,
        avg_dpd_per_delinquency: 8,
        loan_amount: 500_000,
        income: 900_000,
        ..Default::default()
    };
    let assessment = RiskAssessment {
        probability: 0.0456,
        credit_score: 873,
        rating: RiskRating::Excellent,
    };

    let prompt = build_system_prompt(&UserDataContext::new(Some(&assessment), &input));

    assert!(prompt.contains("- utilization_ratio: 72%"));
    assert!(prompt.contains("- delinquency_ratio: 15%"));
    assert!(prompt.contains("- days_past_due: 8"));
    assert!(prompt.contains("- loan_amount: 500000"));
    assert!(prompt.contains(&format!("- probability_of_default: {}", format_percent(0.0456))));
    assert!(prompt.contains("- risk_rating: Excellent"));
}

#[test]
fn test_input_deserializes_with_defaults() {
    let input: ApplicantInput = serde_json::from_str(r#"{"age": 40, "loanPurpose": "Home"}"#).unwrap();
    assert_eq!(input.age, 40);
    assert_eq!(input.loan_purpose, LoanPurpose::Home);
    assert_eq!(input.income, 1_200_000);
    assert_eq!(input.num_open_accounts, 2);

    let snake: ApplicantInput = serde_json::from_str(r#"{"loan_amount": 10}"#).unwrap();
    assert_eq!(snake.loan_amount, 10);
}

#[test]
fn test_event_stream_stops_at_done_marker() {
    use credit_risk::services::chat::decode_event_stream;
    use futures_util::{stream, StreamExt};

    let parts: Vec<Result<&'static [u8], reqwest::Error>> = vec![
        Ok(&b"data: {\"choices\":[{\"delta\":{\"content\":\"Keep \"}}]}\n\n"[..]),
        Ok(&b"data: {\"choices\":[{\"delta\":{\"content\":\"utilization low.\"}}]}\n"[..]),
        Ok(&b"\ndata: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n"[..]),
    ];

    let tokens: Vec<String> = tokio_test::block_on(
        decode_event_stream(stream::iter(parts))
            .map(|t| t.unwrap())
            .collect(),
    );

    assert_eq!(tokens, vec!["Keep ", "utilization low."]);
}
