//! Global temperature scaling (Guo et al., 2017).
//!
//! A single scalar `T > 0` divides every logit before softmax. `T` is fit by
//! minimizing validation NLL; applying it changes only the sharpness of the
//! output distribution, never the argmax.

use serde::{Deserialize, Serialize};
use softcal_core::numeric::{log_sum_exp, scaled_softmax};
use softcal_core::{CalibrateResult, CalibrationConfig, CalibrationWarning};

use crate::optim::fit_log_temperature;
use crate::validate::validate_batch;

/// Single-parameter temperature scaler.
///
/// The fitted temperature is immutable for the lifetime of the scaler. The
/// [`Default`] instance has `T = 1.0` and is the exact identity transform
/// over softmax outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScaler {
    temperature: f64,
    warnings: Vec<CalibrationWarning>,
}

impl Default for TemperatureScaler {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            warnings: Vec::new(),
        }
    }
}

impl TemperatureScaler {
    /// Fit the temperature on a validation set by minimizing the mean
    /// negative log-likelihood of the true labels under `softmax(z / T)`.
    ///
    /// Optimization runs on `ln T` (positivity by construction) with a
    /// backtracking line search, starting from `T = 1.0`, for at most
    /// `config.max_iterations` iterations or until the per-iteration loss
    /// improvement drops below `config.tolerance`. If the loss or gradient
    /// goes non-finite the scaler reverts to the identity and records
    /// [`CalibrationWarning::OptimizationDiverged`].
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
        validate_batch(logits, labels)?;

        let outcome = fit_log_temperature(|t| nll_and_grad(logits, labels, t), config);

        let mut warnings = Vec::new();
        if outcome.diverged {
            tracing::warn!(
                iterations = outcome.iterations,
                "temperature optimization diverged, reverting to identity"
            );
            warnings.push(CalibrationWarning::OptimizationDiverged {
                class: None,
                iterations: outcome.iterations,
            });
        } else {
            tracing::debug!(
                temperature = outcome.temperature,
                iterations = outcome.iterations,
                examples = logits.len(),
                "temperature fitted"
            );
        }

        Ok(Self {
            temperature: outcome.temperature,
            warnings,
        })
    }

    /// The fitted temperature (`1.0` for the unfit/identity scaler).
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Recoverable degradations recorded during the fit.
    #[must_use]
    pub fn warnings(&self) -> &[CalibrationWarning] {
        &self.warnings
    }

    /// Calibrated softmax for one logit vector: `softmax(z / T)`.
    ///
    /// An empty slice yields an empty vector.
    #[must_use]
    pub fn apply(&self, logits: &[f64]) -> Vec<f64> {
        scaled_softmax(logits, self.temperature)
    }

    /// [`apply`](Self::apply) over a batch, preserving order.
    #[must_use]
    pub fn apply_batch(&self, logits: &[Vec<f64>]) -> Vec<Vec<f64>> {
        logits.iter().map(|z| self.apply(z)).collect()
    }
}

/// Mean NLL of the labels under `softmax(z / t)`, and its gradient with
/// respect to `ln t`.
///
/// Per example: `L = logsumexp(z/t) - z_y/t` and
/// `dL/d ln t = (z_y - E_p[z]) / t` with `p = softmax(z/t)`.
#[allow(clippy::cast_precision_loss)]
fn nll_and_grad(logits: &[Vec<f64>], labels: &[usize], t: f64) -> (f64, f64) {
    let mut loss = 0.0;
    let mut grad = 0.0;
    for (z, &y) in logits.iter().zip(labels.iter()) {
        let scaled: Vec<f64> = z.iter().map(|&v| v / t).collect();
        loss += log_sum_exp(&scaled) - scaled[y];

        let probs = scaled_softmax(z, t);
        let expected: f64 = probs.iter().zip(z.iter()).map(|(&p, &v)| p * v).sum();
        grad += (z[y] - expected) / t;
    }
    let n = logits.len() as f64;
    (loss / n, grad / n)
}
