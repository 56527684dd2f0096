//! Class-wise temperature scaling.
//!
//! One temperature per class, each fit against the one-vs-rest reduction of
//! the validation set: `T_k` minimizes the binary cross-entropy between
//! `sigmoid(z_k / T_k)` and the indicator `label == k`. Applying divides each
//! logit by its own temperature before the softmax, so — unlike global
//! scaling — the argmax may legitimately move.

use serde::{Deserialize, Serialize};
use softcal_core::numeric::sigmoid;
use softcal_core::{CalibrateError, CalibrateResult, CalibrationConfig, CalibrationWarning};

use crate::optim::fit_log_temperature;
use crate::validate::validate_batch;

/// Probability clamp keeping the BCE loss finite at saturation.
const PROB_FLOOR: f64 = 1e-10;

/// Per-class temperature scaler.
///
/// Owns one immutable temperature per class after fitting. Classes without
/// positive validation examples keep the identity `T_k = 1.0` and are
/// reported via [`CalibrationWarning::UnseenClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClasswiseTemperatureScaler {
    temperatures: Vec<f64>,
    warnings: Vec<CalibrationWarning>,
}

impl ClasswiseTemperatureScaler {
    /// The identity scaler for `num_classes` classes (all `T_k = 1.0`),
    /// which reproduces the raw softmax exactly.
    #[must_use]
    pub fn identity(num_classes: usize) -> Self {
        Self {
            temperatures: vec![1.0; num_classes],
            warnings: Vec::new(),
        }
    }

    /// Fit one temperature per class on a validation set.
    ///
    /// For every class `k`, the full validation set is reduced to the binary
    /// problem "is the true label `k`?" and `T_k` is fit on logit dimension
    /// `k` alone with the same bounded descent as the global scaler. Each
    /// class degrades independently: an unseen class or a diverged per-class
    /// fit falls back to `T_k = 1.0` with a warning, never failing the run.
    ///
    /// # Errors
    ///
    /// Returns an error when the validation set is empty, logit vectors are
    /// ragged, labels are not parallel, or a label is out of range.
    pub fn fit(
        logits: &[Vec<f64>],
        labels: &[usize],
        config: &CalibrationConfig,
    ) -> CalibrateResult<Self> {
        let num_classes = validate_batch(logits, labels)?;

        let mut temperatures = Vec::with_capacity(num_classes);
        let mut warnings = Vec::new();
        for k in 0..num_classes {
            let class_logits: Vec<f64> = logits.iter().map(|z| z[k]).collect();
            let positives: Vec<bool> = labels.iter().map(|&y| y == k).collect();

            if !positives.contains(&true) {
                tracing::warn!(
                    class = k,
                    "no positive validation examples, temperature fixed at 1.0"
                );
                warnings.push(CalibrationWarning::UnseenClass { class: k });
                temperatures.push(1.0);
                continue;
            }

            let outcome = fit_log_temperature(
                |t| bce_and_grad(&class_logits, &positives, t),
                config,
            );
            if outcome.diverged {
                tracing::warn!(
                    class = k,
                    iterations = outcome.iterations,
                    "class temperature diverged, reverting to identity"
                );
                warnings.push(CalibrationWarning::OptimizationDiverged {
                    class: Some(k),
                    iterations: outcome.iterations,
                });
            }
            temperatures.push(outcome.temperature);
        }

        tracing::debug!(
            num_classes,
            examples = logits.len(),
            warnings = warnings.len(),
            "class-wise temperatures fitted"
        );
        Ok(Self {
            temperatures,
            warnings,
        })
    }

    /// The fitted per-class temperatures.
    #[must_use]
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// Number of classes this scaler was fit for.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.temperatures.len()
    }

    /// Recoverable degradations recorded during the fit.
    #[must_use]
    pub fn warnings(&self) -> &[CalibrationWarning] {
        &self.warnings
    }

    /// Calibrated softmax for one logit vector: softmax of the elementwise
    /// `z_k / T_k`.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::DimensionMismatch`] when the vector length
    /// differs from the fitted class count.
    pub fn apply(&self, logits: &[f64]) -> CalibrateResult<Vec<f64>> {
        if logits.len() != self.temperatures.len() {
            return Err(CalibrateError::DimensionMismatch {
                expected: self.temperatures.len(),
                found: logits.len(),
                index: 0,
            });
        }
        let adjusted: Vec<f64> = logits
            .iter()
            .zip(self.temperatures.iter())
            .map(|(&z, &t)| z / t)
            .collect();
        Ok(softcal_core::numeric::softmax(&adjusted))
    }

    /// [`apply`](Self::apply) over a batch, preserving order.
    ///
    /// # Errors
    ///
    /// Fails on the first vector whose length differs from the class count.
    pub fn apply_batch(&self, logits: &[Vec<f64>]) -> CalibrateResult<Vec<Vec<f64>>> {
        logits.iter().map(|z| self.apply(z)).collect()
    }
}

/// Mean binary cross-entropy of `sigmoid(z / t)` against the one-vs-rest
/// labels, and its gradient with respect to `ln t`.
///
/// Per example: `dL/d ln t = (sigmoid(z/t) - y) * (-z / t)`.
#[allow(clippy::cast_precision_loss)]
fn bce_and_grad(class_logits: &[f64], positives: &[bool], t: f64) -> (f64, f64) {
    let mut loss = 0.0;
    let mut grad = 0.0;
    for (&z, &positive) in class_logits.iter().zip(positives.iter()) {
        let p = sigmoid(z / t).clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
        let y = f64::from(positive);
        loss -= y.mul_add(p.ln(), (1.0 - y) * (1.0 - p).ln());
        grad += (p - y) * (-z / t);
    }
    let n = class_logits.len() as f64;
    (loss / n, grad / n)
}

#[cfg(test)]
mod tests {
    use softcal_core::numeric::softmax;
    use tracing_test::traced_test;

    use super::*;

    const EPSILON: f64 = 1e-9;

    /// Three-class set where class 0 is overconfident and class 2 never occurs.
    fn skewed_set() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut logits = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            logits.push(vec![6.0, -1.0, -2.0]);
            labels.push(if i % 3 == 0 { 0 } else { 1 });
        }
        (logits, labels)
    }

    #[test]
    fn identity_scaler_reproduces_raw_softmax() {
        let scaler = ClasswiseTemperatureScaler::identity(3);
        let logits = [1.5, -0.5, 0.0];
        let raw = softmax(&logits);
        let calibrated = scaler.apply(&logits).unwrap();
        for (r, c) in raw.iter().zip(calibrated.iter()) {
            assert!((r - c).abs() < EPSILON);
        }
    }

    #[test]
    fn fit_produces_one_temperature_per_class() {
        let (logits, labels) = skewed_set();
        let scaler =
            ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
                .unwrap();
        assert_eq!(scaler.num_classes(), 3);
        assert!(scaler.temperatures().iter().all(|&t| t > 0.0 && t.is_finite()));
    }

    #[test]
    #[traced_test]
    fn unseen_class_keeps_identity_with_warning() {
        let (logits, labels) = skewed_set();
        let scaler =
            ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
                .unwrap();
        // Class 2 never appears as a true label.
        assert!((scaler.temperatures()[2] - 1.0).abs() < f64::EPSILON);
        assert!(scaler
            .warnings()
            .iter()
            .any(|w| matches!(w, CalibrationWarning::UnseenClass { class: 2 })));
        assert!(logs_contain("no positive validation examples"));
    }

    #[test]
    fn overconfident_class_is_flattened() {
        let (logits, labels) = skewed_set();
        let scaler =
            ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
                .unwrap();
        // Class 0 fires at z=6 but is right only a third of the time.
        assert!(
            scaler.temperatures()[0] > 1.0,
            "got T_0 = {}",
            scaler.temperatures()[0]
        );
    }

    #[test]
    fn apply_output_is_probability_vector() {
        let (logits, labels) = skewed_set();
        let scaler =
            ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
                .unwrap();
        let probs = scaler.apply(&[2.0, 1.0, 0.5]).unwrap();
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn apply_rejects_wrong_dimension() {
        let scaler = ClasswiseTemperatureScaler::identity(3);
        let err = scaler.apply(&[0.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            CalibrateError::DimensionMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn argmax_may_move_and_is_not_fixed_up() {
        // T_0 large (flattens class 0), T_1 small (sharpens class 1): a raw
        // argmax of 0 can flip to 1 after scaling. This is contract, not a bug.
        let scaler = ClasswiseTemperatureScaler {
            temperatures: vec![10.0, 0.5],
            warnings: Vec::new(),
        };
        let logits = [2.0, 1.5];
        let raw = softmax(&logits);
        let calibrated = scaler.apply(&logits).unwrap();
        assert!(raw[0] > raw[1]);
        assert!(calibrated[1] > calibrated[0]);
    }

    #[test]
    fn fit_rejects_empty_set() {
        assert!(
            ClasswiseTemperatureScaler::fit(&[], &[], &CalibrationConfig::default()).is_err()
        );
    }

    #[test]
    fn fit_is_deterministic() {
        let (logits, labels) = skewed_set();
        let a = ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
            .unwrap();
        let b = ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
            .unwrap();
        assert_eq!(a.temperatures(), b.temperatures());
    }

    #[test]
    fn serde_round_trip() {
        let (logits, labels) = skewed_set();
        let scaler =
            ClasswiseTemperatureScaler::fit(&logits, &labels, &CalibrationConfig::default())
                .unwrap();
        let json = serde_json::to_string(&scaler).unwrap();
        let decoded: ClasswiseTemperatureScaler = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, scaler);
    }
}
