//! Histogram binning posterior estimation (Zadrozny & Elkan, 2001) with
//! linear rescaling of the non-argmax mass.
//!
//! Fitting partitions the confidence range `[0, 1]` into equal-width bins,
//! estimates each bin's empirical top-1 accuracy on the validation set, and
//! freezes the result as a lookup table. At inference the argmax entry of a
//! softmax vector is replaced by its bin's accuracy and the remaining entries
//! are rescaled proportionally so the vector still sums to 1.

use serde::{Deserialize, Serialize};
use softcal_core::numeric::argmax;
use softcal_core::{CalibrateError, CalibrateResult, CalibrationWarning};

use crate::validate::validate_batch;

/// Below this, the non-argmax mass is treated as zero and the remainder is
/// redistributed uniformly instead of rescaled (avoids dividing by dust).
const REMAINDER_FLOOR: f64 = 1e-12;

/// One confidence interval `[lower, upper)` with its validation statistics.
///
/// The final bin is closed at 1.0: a confidence of exactly 1.0 clamps into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Exclusive upper edge (inclusive for the final bin).
    pub upper: f64,
    /// Validation examples whose confidence fell in this bin.
    pub count: usize,
    /// How many of those predictions were correct.
    pub correct: usize,
    /// Empirical accuracy, or the bin midpoint when `count == 0`.
    pub accuracy: f64,
}

/// Frozen histogram-binning calibrator.
///
/// Bins are constructed once by [`fit`](Self::fit) and immutable afterwards;
/// inference is a pure lookup plus rescaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBinningCalibrator {
    bins: Vec<Bin>,
    warnings: Vec<CalibrationWarning>,
}

impl HistogramBinningCalibrator {
    /// Fit bins from validation softmax vectors and true labels.
    ///
    /// Per example: confidence is the max entry, correctness is whether the
    /// argmax equals the label. Empty bins fall back to their midpoint
    /// (identity mapping) and record [`CalibrationWarning::EmptyBin`].
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidBinCount`] for `n_bins == 0`, and the
    /// usual shape errors for empty/ragged/unparallel input.
    pub fn fit(
        softmaxes: &[Vec<f64>],
        labels: &[usize],
        n_bins: usize,
    ) -> CalibrateResult<Self> {
        if n_bins == 0 {
            return Err(CalibrateError::InvalidBinCount { requested: 0 });
        }
        validate_batch(softmaxes, labels)?;

        let outcomes: Vec<(f64, bool)> = softmaxes
            .iter()
            .zip(labels.iter())
            .filter_map(|(sm, &label)| {
                argmax(sm).map(|pred| (sm[pred], pred == label))
            })
            .collect();
        Self::fit_from_outcomes(&outcomes, n_bins)
    }

    /// Fit bins from pre-extracted `(confidence, correct)` validation pairs.
    ///
    /// Useful when the top-1 outcomes were computed elsewhere (e.g. exported
    /// from an evaluation run) and the full softmax vectors are gone.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidBinCount`] for `n_bins == 0` and
    /// [`CalibrateError::EmptyValidationSet`] for no outcomes.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit_from_outcomes(outcomes: &[(f64, bool)], n_bins: usize) -> CalibrateResult<Self> {
        if n_bins == 0 {
            return Err(CalibrateError::InvalidBinCount { requested: 0 });
        }
        if outcomes.is_empty() {
            return Err(CalibrateError::EmptyValidationSet);
        }

        let width = 1.0 / n_bins as f64;
        let mut counts = vec![0_usize; n_bins];
        let mut corrects = vec![0_usize; n_bins];
        for &(confidence, correct) in outcomes {
            let idx = bin_index(confidence, n_bins);
            counts[idx] += 1;
            if correct {
                corrects[idx] += 1;
            }
        }

        let mut bins = Vec::with_capacity(n_bins);
        let mut warnings = Vec::new();
        for i in 0..n_bins {
            let lower = i as f64 * width;
            let upper = if i + 1 == n_bins {
                1.0
            } else {
                (i + 1) as f64 * width
            };
            let accuracy = if counts[i] > 0 {
                corrects[i] as f64 / counts[i] as f64
            } else {
                let midpoint = f64::midpoint(lower, upper);
                tracing::warn!(
                    bin = i,
                    midpoint,
                    "empty bin, accuracy falls back to midpoint"
                );
                warnings.push(CalibrationWarning::EmptyBin { bin: i, midpoint });
                midpoint
            };
            bins.push(Bin {
                lower,
                upper,
                count: counts[i],
                correct: corrects[i],
                accuracy,
            });
        }

        tracing::debug!(
            n_bins,
            examples = outcomes.len(),
            empty_bins = warnings.len(),
            "histogram bins fitted"
        );
        Ok(Self { bins, warnings })
    }

    /// Number of bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// The frozen bins, ordered by confidence range.
    #[must_use]
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Recoverable degradations recorded during the fit.
    #[must_use]
    pub fn warnings(&self) -> &[CalibrationWarning] {
        &self.warnings
    }

    /// Index of the bin holding `confidence`.
    ///
    /// Non-finite values sanitize to 0.0; 1.0 clamps into the last bin.
    #[must_use]
    pub fn bin_index(&self, confidence: f64) -> usize {
        bin_index(confidence, self.bins.len())
    }

    /// The learned mapping from raw top-1 confidence to estimated accuracy.
    #[must_use]
    pub fn calibrated_confidence(&self, confidence: f64) -> f64 {
        self.bins[self.bin_index(confidence)].accuracy
    }

    /// Calibrate one softmax vector.
    ///
    /// The argmax entry becomes its bin's accuracy; the other entries are
    /// rescaled linearly to sum to the complement, preserving their relative
    /// proportions. When the raw vector had all its mass on one class, the
    /// complement is distributed uniformly over the other classes. The output
    /// always sums to 1 within floating-point tolerance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn apply(&self, softmax: &[f64]) -> Vec<f64> {
        if softmax.is_empty() {
            return Vec::new();
        }
        if softmax.len() == 1 {
            // One class: the only valid distribution.
            return vec![1.0];
        }
        let Some(pred) = argmax(softmax) else {
            return Vec::new();
        };
        let raw_confidence = softmax[pred];
        let calibrated = self.calibrated_confidence(raw_confidence);
        let remainder = 1.0 - calibrated;

        let raw_remainder: f64 = softmax
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != pred)
            .map(|(_, &p)| p)
            .sum();

        let mut out = vec![0.0; softmax.len()];
        if raw_remainder > REMAINDER_FLOOR {
            let factor = remainder / raw_remainder;
            for (j, &p) in softmax.iter().enumerate() {
                if j != pred {
                    out[j] = p * factor;
                }
            }
        } else {
            // All mass was on the predicted class: spread the complement
            // uniformly rather than dividing by zero.
            let uniform = remainder / (softmax.len() - 1) as f64;
            for (j, slot) in out.iter_mut().enumerate() {
                if j != pred {
                    *slot = uniform;
                }
            }
        }
        out[pred] = calibrated;

        // Guard against tiny numerical imprecision in the rescale.
        let sum: f64 = out.iter().sum();
        if sum > 0.0 && sum.is_finite() {
            for value in &mut out {
                *value /= sum;
            }
        }
        out
    }

    /// [`apply`](Self::apply) over a batch, preserving order.
    #[must_use]
    pub fn apply_batch(&self, softmaxes: &[Vec<f64>]) -> Vec<Vec<f64>> {
        softmaxes.iter().map(|sm| self.apply(sm)).collect()
    }

    /// Sample the learned confidence mapping at `resolution` evenly spaced
    /// query points across `[0, 1]`, as `(raw, calibrated)` pairs.
    ///
    /// Intended for external reporting tools; the core never plots.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mapping_table(&self, resolution: usize) -> Vec<(f64, f64)> {
        match resolution {
            0 => Vec::new(),
            1 => vec![(0.0, self.calibrated_confidence(0.0))],
            _ => (0..resolution)
                .map(|i| {
                    let raw = i as f64 / (resolution - 1) as f64;
                    (raw, self.calibrated_confidence(raw))
                })
                .collect(),
        }
    }
}

/// Equal-width bin index: `[0, 1/B), [1/B, 2/B), ..., [(B-1)/B, 1]`.
/// Non-finite confidences sanitize to 0.0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn bin_index(confidence: f64, n_bins: usize) -> usize {
    let c = if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((c * n_bins as f64) as usize).min(n_bins - 1)
}
