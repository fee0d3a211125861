//! Display-ready shaping of a validated prediction.
//!
//! A report is a pure function of a [`Prediction`]: the class display
//! name, the raw confidence, and percentage strings formatted to two
//! decimals for rendering. The embedding application serializes it
//! directly into its response body.

use crate::domain::label::ClassLabel;
use crate::domain::prediction::Prediction;
use serde::Serialize;
use std::collections::BTreeMap;

/// A user-facing classification report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningReport {
    /// Display name of the predicted class.
    pub class: String,
    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f32,
    /// Confidence formatted as a percentage, e.g. `"97.35%"`.
    pub confidence_percentage: String,
    /// Per-class percentages keyed by display name.
    pub probabilities: BTreeMap<String, String>,
}

impl ScreeningReport {
    /// Shapes a prediction into its display form.
    pub fn from_prediction(prediction: &Prediction) -> Self {
        let probabilities = prediction
            .probabilities()
            .map(|(label, p)| (label.display_name().to_string(), format_percentage(p)))
            .collect();

        Self {
            class: prediction.label().display_name().to_string(),
            confidence: prediction.confidence(),
            confidence_percentage: format_percentage(prediction.confidence()),
            probabilities,
        }
    }
}

/// Formats a unit-range probability as a two-decimal percentage.
fn format_percentage(probability: f32) -> String {
    format!("{:.2}%", probability * 100.0)
}
