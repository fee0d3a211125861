//! Decoding of raw model output into a validated prediction.
//!
//! The deployed screening model ends in a single sigmoid unit whose value
//! is the probability of the `Normal` class; two-unit heads are also
//! accepted for artifacts exported with an explicit softmax or logit
//! pair. Whatever the head shape, decoding always produces a
//! [`Prediction`] whose probabilities are non-negative and sum to one,
//! whose label is the argmax class, and whose confidence equals the
//! maximum probability. Those invariants are enforced at construction,
//! never assumed.

use crate::core::errors::{ScreenError, ScreenResult};
use crate::domain::label::ClassLabel;
use serde::Serialize;

/// Tolerance accepted on the incoming probability sum before the
/// distribution is rejected as malformed.
const SUM_TOLERANCE: f32 = 1e-4;

/// A validated classification outcome.
///
/// Constructed through [`Prediction::from_model_output`] or
/// [`Prediction::from_probabilities`]; direct construction is not exposed
/// so the invariants hold for every value of this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// The predicted class: the argmax of the probability distribution.
    label: ClassLabel,
    /// The probability of the predicted class.
    confidence: f32,
    /// Per-class probabilities, indexed by [`ClassLabel::index`].
    probabilities: [f32; ClassLabel::COUNT],
}

impl Prediction {
    /// Decodes the raw output of a forward pass.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The model name for error context.
    /// * `output` - The flat output values for one batch item.
    ///
    /// # Returns
    ///
    /// A validated Prediction, or a `ScreenError::Inference` when the
    /// output arity is unexpected or the values are not usable as a
    /// probability distribution.
    pub fn from_model_output(model_name: &str, output: &[f32]) -> ScreenResult<Self> {
        let probabilities = match output {
            [value] => {
                if !value.is_finite() {
                    return Err(ScreenError::inference_msg(
                        model_name,
                        format!("sigmoid output is not finite: {value}"),
                    ));
                }
                // In-range values are already probabilities; anything else
                // is a logit from an artifact exported without the final
                // activation.
                let p_normal = if (0.0..=1.0).contains(value) {
                    *value
                } else {
                    sigmoid(*value)
                };
                [1.0 - p_normal, p_normal]
            }
            [a, b] => {
                if !a.is_finite() || !b.is_finite() {
                    return Err(ScreenError::inference_msg(
                        model_name,
                        format!("output values are not finite: [{a}, {b}]"),
                    ));
                }
                let sum = a + b;
                if *a >= 0.0 && *b >= 0.0 && (sum - 1.0).abs() <= SUM_TOLERANCE {
                    [*a, *b]
                } else {
                    softmax2(*a, *b)
                }
            }
            other => {
                return Err(ScreenError::inference_msg(
                    model_name,
                    format!(
                        "expected 1 or 2 output values for {} classes, got {}",
                        ClassLabel::COUNT,
                        other.len()
                    ),
                ));
            }
        };

        Self::from_probabilities(probabilities).map_err(|e| match e {
            ScreenError::Inference { context, source, .. } => ScreenError::Inference {
                model: model_name.to_string(),
                context,
                source,
            },
            other => other,
        })
    }

    /// Builds a prediction from an explicit per-class distribution.
    ///
    /// The distribution is validated (finite, non-negative, summing to one
    /// within tolerance) and renormalized so the stored probabilities sum
    /// to one exactly up to floating-point rounding.
    pub fn from_probabilities(probabilities: [f32; ClassLabel::COUNT]) -> ScreenResult<Self> {
        for (index, &p) in probabilities.iter().enumerate() {
            if !p.is_finite() || p < 0.0 {
                return Err(ScreenError::inference_msg(
                    "output-decode",
                    format!("probability for class {index} is invalid: {p}"),
                ));
            }
        }
        let sum: f32 = probabilities.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(ScreenError::inference_msg(
                "output-decode",
                format!("probabilities sum to {sum}, expected 1"),
            ));
        }

        let mut normalized = probabilities;
        for p in &mut normalized {
            *p /= sum;
        }

        // Strictly greater wins, so an exact 0.5/0.5 tie resolves to the
        // indicator class, matching the decision rule the model was
        // trained against (normal only above 0.5).
        let label = if normalized[ClassLabel::Normal.index()]
            > normalized[ClassLabel::DownSyndrome.index()]
        {
            ClassLabel::Normal
        } else {
            ClassLabel::DownSyndrome
        };

        Ok(Self {
            label,
            confidence: normalized[label.index()],
            probabilities: normalized,
        })
    }

    /// The predicted class.
    pub fn label(&self) -> ClassLabel {
        self.label
    }

    /// The probability of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// The probability assigned to the given class.
    pub fn probability_of(&self, label: ClassLabel) -> f32 {
        self.probabilities[label.index()]
    }

    /// Per-class probabilities in index order.
    pub fn probabilities(&self) -> impl Iterator<Item = (ClassLabel, f32)> + '_ {
        ClassLabel::all()
            .into_iter()
            .map(|label| (label, self.probabilities[label.index()]))
    }
}

/// Numerically stable logistic function.
fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Two-way softmax with max subtraction.
fn softmax2(a: f32, b: f32) -> [f32; 2] {
    let m = a.max(b);
    let ea = (a - m).exp();
    let eb = (b - m).exp();
    let sum = ea + eb;
    [ea / sum, eb / sum]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(prediction: &Prediction) {
        let sum: f32 = prediction.probabilities().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        for (_, p) in prediction.probabilities() {
            assert!((0.0..=1.0).contains(&p));
        }
        let (argmax_label, max_p) = prediction
            .probabilities()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .unwrap();
        assert_eq!(prediction.label(), argmax_label);
        assert_eq!(prediction.confidence(), max_p);
    }

    #[test]
    fn sigmoid_output_above_half_is_normal() {
        let prediction = Prediction::from_model_output("m", &[0.92]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::Normal);
        assert!((prediction.confidence() - 0.92).abs() < 1e-6);
        assert!((prediction.probability_of(ClassLabel::DownSyndrome) - 0.08).abs() < 1e-6);
        assert_valid(&prediction);
    }

    #[test]
    fn sigmoid_output_below_half_is_indicator() {
        let prediction = Prediction::from_model_output("m", &[0.2]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::DownSyndrome);
        assert!((prediction.confidence() - 0.8).abs() < 1e-6);
        assert_valid(&prediction);
    }

    #[test]
    fn exact_half_resolves_to_indicator() {
        let prediction = Prediction::from_model_output("m", &[0.5]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::DownSyndrome);
    }

    #[test]
    fn logit_output_is_sigmoided() {
        let prediction = Prediction::from_model_output("m", &[3.5]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::Normal);
        assert!(prediction.confidence() > 0.9);
        assert_valid(&prediction);
    }

    #[test]
    fn two_value_distribution_is_taken_as_is() {
        let prediction = Prediction::from_model_output("m", &[0.3, 0.7]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::Normal);
        assert!((prediction.probability_of(ClassLabel::DownSyndrome) - 0.3).abs() < 1e-6);
        assert_valid(&prediction);
    }

    #[test]
    fn two_value_logits_are_softmaxed() {
        let prediction = Prediction::from_model_output("m", &[2.0, -1.0]).unwrap();
        assert_eq!(prediction.label(), ClassLabel::DownSyndrome);
        assert_valid(&prediction);
    }

    #[test]
    fn decoding_is_deterministic() {
        let a = Prediction::from_model_output("m", &[0.6180339]).unwrap();
        let b = Prediction::from_model_output("m", &[0.6180339]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unexpected_arity_is_an_inference_error() {
        let err = Prediction::from_model_output("m", &[0.1, 0.2, 0.7]).unwrap_err();
        assert!(matches!(err, ScreenError::Inference { .. }));
        let err = Prediction::from_model_output("m", &[]).unwrap_err();
        assert!(matches!(err, ScreenError::Inference { .. }));
    }

    #[test]
    fn non_finite_output_is_rejected() {
        assert!(Prediction::from_model_output("m", &[f32::NAN]).is_err());
        assert!(Prediction::from_model_output("m", &[f32::INFINITY, 0.0]).is_err());
    }

    #[test]
    fn malformed_distribution_is_rejected() {
        assert!(Prediction::from_probabilities([0.9, 0.9]).is_err());
        assert!(Prediction::from_probabilities([-0.1, 1.1]).is_err());
    }
}
