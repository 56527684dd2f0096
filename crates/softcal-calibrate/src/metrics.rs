//! Scalar calibration quality metrics.
//!
//! These are audit numbers for fit reports and monitoring — reliability
//! diagrams and any other plotting stay outside the core.

/// Expected Calibration Error over `(confidence, correctness)` pairs.
///
/// Partitions confidences into `n_bins` equal-width bins and computes the
/// weighted average of `|avg_confidence - accuracy|` per bin. Lower is
/// better; a common threshold for "well-calibrated" is ECE < 0.05.
///
/// Inputs are truncated to the shorter slice. Returns `0.0` for empty input
/// or `n_bins == 0`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn expected_calibration_error(confidences: &[f64], correct: &[bool], n_bins: usize) -> f64 {
    if confidences.is_empty() || correct.is_empty() || n_bins == 0 {
        return 0.0;
    }
    let n = confidences.len().min(correct.len());

    let mut bin_confidence = vec![0.0_f64; n_bins];
    let mut bin_correct = vec![0_usize; n_bins];
    let mut bin_counts = vec![0_usize; n_bins];

    for i in 0..n {
        let c = if confidences[i].is_finite() {
            confidences[i].clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bin = ((c * n_bins as f64) as usize).min(n_bins - 1);
        bin_confidence[bin] += c;
        if correct[i] {
            bin_correct[bin] += 1;
        }
        bin_counts[bin] += 1;
    }

    let mut ece = 0.0_f64;
    for bin in 0..n_bins {
        if bin_counts[bin] > 0 {
            let avg_confidence = bin_confidence[bin] / bin_counts[bin] as f64;
            let accuracy = bin_correct[bin] as f64 / bin_counts[bin] as f64;
            ece += (bin_counts[bin] as f64 / n as f64) * (avg_confidence - accuracy).abs();
        }
    }
    ece
}

/// Brier score of top-1 confidences against correctness: mean squared error
/// of `confidence` vs. the 0/1 outcome. Lower is better.
///
/// Returns `0.0` for empty input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn brier_score(confidences: &[f64], correct: &[bool]) -> f64 {
    if confidences.is_empty() || correct.is_empty() {
        return 0.0;
    }
    let n = confidences.len().min(correct.len());
    let sum_sq: f64 = confidences
        .iter()
        .zip(correct.iter())
        .take(n)
        .map(|(&c, &y)| (c - f64::from(y)).powi(2))
        .sum();
    sum_sq / n as f64
}
