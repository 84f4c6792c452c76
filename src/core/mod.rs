// Core scoring exports
pub mod features;
pub mod predictor;
pub mod prompt;

pub use features::{Bounds, FeatureBounds, FeatureVector};
pub use predictor::{credit_score, LogisticPredictor, ModelCoefficients, Predictor};
pub use prompt::{build_system_prompt, format_percent, UserDataContext};
